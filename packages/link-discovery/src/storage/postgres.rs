use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::{StoreError, StoreResult};
use crate::traits::DiscoveryStore;
use crate::types::*;

pub struct PostgresDiscoveryStore {
    pool: PgPool,
}

impl PostgresDiscoveryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode_label<T>(raw: &str) -> StoreResult<T>
where
    T: std::str::FromStr<Err = UnknownVariant>,
{
    raw.parse()
        .map_err(|e: UnknownVariant| StoreError::Database(sqlx::Error::Decode(Box::new(e))))
}

fn score(value: i16) -> u8 {
    value.clamp(0, 100) as u8
}

fn count(value: i32) -> u32 {
    value.max(0) as u32
}

fn row_to_url(r: &PgRow) -> StoreResult<DiscoveredUrl> {
    Ok(DiscoveredUrl {
        id: UrlId(r.try_get("id")?),
        url: r.try_get("url")?,
        domain: r.try_get("domain")?,
        link_type: decode_label(r.try_get("link_type")?)?,
        domain_authority: score(r.try_get("domain_authority")?),
        page_authority: score(r.try_get("page_authority")?),
        spam_score: score(r.try_get("spam_score")?),
        success_rate: score(r.try_get("success_rate")?),
        status: decode_label(r.try_get("status")?)?,
        upvotes: count(r.try_get("upvotes")?),
        downvotes: count(r.try_get("downvotes")?),
        reports: count(r.try_get("reports")?),
        auto_clean_score: count(r.try_get("auto_clean_score")?),
        discovered_by: r.try_get("discovered_by")?,
        discovered_at: r.try_get("discovered_at")?,
        last_verified: r.try_get("last_verified")?,
        metadata: r.try_get("metadata")?,
    })
}

fn labels(link_types: &[LinkType]) -> Vec<String> {
    link_types.iter().map(|t| t.as_str().to_string()).collect()
}

#[async_trait]
impl DiscoveryStore for PostgresDiscoveryStore {
    // ========================================================================
    // QUEUE
    // ========================================================================

    async fn enqueue_request(&self, id: QueueId, request: &DiscoveryRequest) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO discovery_queue (
                id, keywords, link_types, discovery_depth,
                priority, max_results, requested_by, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id.0)
        .bind(&request.keywords)
        .bind(labels(&request.link_types))
        .bind(request.discovery_depth as i32)
        .bind(request.priority)
        .bind(request.max_results.map(|m| m as i32))
        .bind(request.requested_by)
        .bind(QueueStatus::Queued.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_queue_status(&self, id: QueueId, status: QueueStatus) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE discovery_queue
            SET status = $1,
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(status.as_str())
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ========================================================================
    // DISCOVERED URLS
    // ========================================================================

    async fn url_exists(&self, url: &str) -> StoreResult<bool> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM discovered_urls WHERE url = $1) AS found")
            .bind(url)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("found")?)
    }

    async fn insert_url(&self, url: &DiscoveredUrl) -> StoreResult<UrlId> {
        // The unique index on url is the final arbiter; a conflict returns no row.
        let row = sqlx::query(
            r#"
            INSERT INTO discovered_urls (
                id, url, domain, link_type,
                domain_authority, page_authority, spam_score, success_rate,
                status, upvotes, downvotes, reports, auto_clean_score,
                discovered_by, discovered_at, last_verified, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (url) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(url.id.0)
        .bind(&url.url)
        .bind(&url.domain)
        .bind(url.link_type.as_str())
        .bind(i16::from(url.domain_authority))
        .bind(i16::from(url.page_authority))
        .bind(i16::from(url.spam_score))
        .bind(i16::from(url.success_rate))
        .bind(url.status.as_str())
        .bind(url.upvotes as i32)
        .bind(url.downvotes as i32)
        .bind(url.reports as i32)
        .bind(url.auto_clean_score as i32)
        .bind(&url.discovered_by)
        .bind(url.discovered_at)
        .bind(url.last_verified)
        .bind(&url.metadata)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(UrlId(r.try_get("id")?)),
            None => Err(StoreError::Duplicate {
                url: url.url.clone(),
            }),
        }
    }

    async fn list_urls(&self, filter: &UrlFilter) -> StoreResult<Vec<DiscoveredUrl>> {
        let rows = sqlx::query(
            r#"
            SELECT id, url, domain, link_type,
                   domain_authority, page_authority, spam_score, success_rate,
                   status, upvotes, downvotes, reports, auto_clean_score,
                   discovered_by, discovered_at, last_verified, metadata
            FROM discovered_urls
            WHERE ($1::text IS NULL OR link_type = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY discovered_at DESC, url
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.link_type.map(|t| t.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(i64::try_from(filter.limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(filter.offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_url).collect()
    }

    async fn update_url_status(&self, id: UrlId, status: UrlStatus) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE discovered_urls
            SET status = $1,
                last_verified = CASE WHEN $1 IN ('verified', 'working') THEN NOW() ELSE last_verified END
            WHERE id = $2
            "#,
        )
        .bind(status.as_str())
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { id });
        }
        Ok(())
    }

    // ========================================================================
    // AGGREGATES
    // ========================================================================

    async fn fetch_stats(&self) -> StoreResult<DiscoveryStats> {
        let row = sqlx::query("SELECT get_discovery_stats() AS stats")
            .fetch_one(&self.pool)
            .await?;

        let stats: serde_json::Value = row.try_get("stats")?;
        Ok(serde_json::from_value(stats)?)
    }

    // ========================================================================
    // COMMUNITY SIGNALS
    // ========================================================================

    async fn record_vote(&self, id: UrlId, direction: VoteDirection) -> StoreResult<()> {
        let query = match direction {
            VoteDirection::Up => "UPDATE discovered_urls SET upvotes = upvotes + 1 WHERE id = $1",
            VoteDirection::Down => {
                "UPDATE discovered_urls SET downvotes = downvotes + 1 WHERE id = $1"
            }
        };

        let result = sqlx::query(query).bind(id.0).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { id });
        }
        Ok(())
    }

    async fn record_report(&self, id: UrlId, _reason: &str, penalty: u32) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE discovered_urls
            SET reports = reports + 1,
                auto_clean_score = auto_clean_score + $1
            WHERE id = $2
            "#,
        )
        .bind(penalty as i32)
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { id });
        }
        Ok(())
    }

    async fn record_contribution(&self, contribution: &Contribution) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_contributions (user_id, url_id, kind, reason, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(contribution.user_id)
        .bind(contribution.url_id.0)
        .bind(contribution.kind.as_str())
        .bind(contribution.reason.as_deref())
        .bind(contribution.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ========================================================================
    // SESSIONS
    // ========================================================================

    async fn save_session(&self, session: &DiscoverySession) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO discovery_sessions (
                id, queue_id, target_keywords, target_link_types,
                total_urls_discovered, verified_urls, working_urls,
                status, started_at, ended_at, error
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                total_urls_discovered = EXCLUDED.total_urls_discovered,
                verified_urls = EXCLUDED.verified_urls,
                working_urls = EXCLUDED.working_urls,
                status = EXCLUDED.status,
                ended_at = EXCLUDED.ended_at,
                error = EXCLUDED.error
            "#,
        )
        .bind(session.id.0)
        .bind(session.queue_id.0)
        .bind(&session.target_keywords)
        .bind(labels(&session.target_link_types))
        .bind(session.total_urls_discovered as i32)
        .bind(session.verified_urls as i32)
        .bind(session.working_urls as i32)
        .bind(session.status.as_str())
        .bind(session.started_at)
        .bind(session.ended_at)
        .bind(session.error.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ========================================================================
    // MAINTENANCE
    // ========================================================================

    async fn run_cleanup(&self) -> StoreResult<u64> {
        let row = sqlx::query("SELECT auto_cleanup_discovered_urls() AS removed")
            .fetch_one(&self.pool)
            .await?;

        let removed: i32 = row.try_get("removed")?;
        Ok(removed.max(0) as u64)
    }
}
