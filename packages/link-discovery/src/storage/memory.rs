//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::DiscoveryStore;
use crate::types::*;

/// Auto-clean score at which the cleanup pass removes a URL.
pub const CLEANUP_THRESHOLD: u32 = 50;

#[derive(Debug, Default)]
struct Tables {
    urls: HashMap<UrlId, DiscoveredUrl>,
    queue: Vec<(QueueId, DiscoveryRequest, QueueStatus)>,
    contributions: Vec<Contribution>,
    sessions: HashMap<SessionId, DiscoverySession>,
}

/// In-memory store for discovered URLs, queue rows and contributions.
///
/// Not suitable for production as data is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryDiscoveryStore {
    tables: RwLock<Tables>,
    unavailable: bool,
}

impl MemoryDiscoveryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose tables were never created: every call answers `SchemaMissing`.
    pub fn unavailable() -> Self {
        Self {
            tables: RwLock::default(),
            unavailable: true,
        }
    }

    /// Seed rows directly, bypassing the uniqueness check.
    pub fn with_urls(self, urls: impl IntoIterator<Item = DiscoveredUrl>) -> Self {
        {
            let mut tables = self.tables.write().unwrap();
            for url in urls {
                tables.urls.insert(url.id, url);
            }
        }
        self
    }

    pub fn url_count(&self) -> usize {
        self.tables.read().unwrap().urls.len()
    }

    pub fn queue_entries(&self) -> Vec<(QueueId, QueueStatus)> {
        self.tables
            .read()
            .unwrap()
            .queue
            .iter()
            .map(|(id, _, status)| (*id, *status))
            .collect()
    }

    pub fn contributions(&self) -> Vec<Contribution> {
        self.tables.read().unwrap().contributions.clone()
    }

    pub fn sessions(&self) -> Vec<DiscoverySession> {
        self.tables.read().unwrap().sessions.values().cloned().collect()
    }

    pub fn get(&self, id: UrlId) -> Option<DiscoveredUrl> {
        self.tables.read().unwrap().urls.get(&id).cloned()
    }

    pub fn all_urls(&self) -> Vec<DiscoveredUrl> {
        self.tables.read().unwrap().urls.values().cloned().collect()
    }

    fn check(&self, object: &str) -> StoreResult<()> {
        if self.unavailable {
            Err(StoreError::schema_missing(object))
        } else {
            Ok(())
        }
    }

    fn update_url<F>(&self, id: UrlId, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut DiscoveredUrl),
    {
        self.check("discovered_urls")?;
        let mut tables = self.tables.write().unwrap();
        let url = tables.urls.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        f(url);
        Ok(())
    }
}

#[async_trait]
impl DiscoveryStore for MemoryDiscoveryStore {
    async fn enqueue_request(&self, id: QueueId, request: &DiscoveryRequest) -> StoreResult<()> {
        self.check("discovery_queue")?;
        self.tables
            .write()
            .unwrap()
            .queue
            .push((id, request.clone(), QueueStatus::Queued));
        Ok(())
    }

    async fn update_queue_status(&self, id: QueueId, status: QueueStatus) -> StoreResult<()> {
        self.check("discovery_queue")?;
        let mut tables = self.tables.write().unwrap();
        if let Some(entry) = tables.queue.iter_mut().find(|(qid, _, _)| *qid == id) {
            entry.2 = status;
        }
        Ok(())
    }

    async fn url_exists(&self, url: &str) -> StoreResult<bool> {
        self.check("discovered_urls")?;
        Ok(self
            .tables
            .read()
            .unwrap()
            .urls
            .values()
            .any(|u| u.url == url))
    }

    async fn insert_url(&self, url: &DiscoveredUrl) -> StoreResult<UrlId> {
        self.check("discovered_urls")?;
        let mut tables = self.tables.write().unwrap();
        if tables.urls.values().any(|u| u.url == url.url) {
            return Err(StoreError::Duplicate {
                url: url.url.clone(),
            });
        }
        tables.urls.insert(url.id, url.clone());
        Ok(url.id)
    }

    async fn list_urls(&self, filter: &UrlFilter) -> StoreResult<Vec<DiscoveredUrl>> {
        self.check("discovered_urls")?;
        let tables = self.tables.read().unwrap();
        let mut urls: Vec<_> = tables
            .urls
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        urls.sort_by(|a, b| b.discovered_at.cmp(&a.discovered_at).then(a.url.cmp(&b.url)));

        Ok(urls
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect())
    }

    async fn update_url_status(&self, id: UrlId, status: UrlStatus) -> StoreResult<()> {
        self.update_url(id, |url| {
            url.status = status;
            if status.is_verified() {
                url.last_verified = Some(chrono::Utc::now());
            }
        })
    }

    async fn fetch_stats(&self) -> StoreResult<DiscoveryStats> {
        self.check("get_discovery_stats")?;
        let urls: Vec<_> = self.tables.read().unwrap().urls.values().cloned().collect();
        Ok(DiscoveryStats::from_urls(&urls))
    }

    async fn record_vote(&self, id: UrlId, direction: VoteDirection) -> StoreResult<()> {
        self.update_url(id, |url| match direction {
            VoteDirection::Up => url.upvotes += 1,
            VoteDirection::Down => url.downvotes += 1,
        })
    }

    async fn record_report(&self, id: UrlId, _reason: &str, penalty: u32) -> StoreResult<()> {
        self.update_url(id, |url| {
            url.reports += 1;
            url.auto_clean_score += penalty;
        })
    }

    async fn record_contribution(&self, contribution: &Contribution) -> StoreResult<()> {
        self.check("user_contributions")?;
        self.tables
            .write()
            .unwrap()
            .contributions
            .push(contribution.clone());
        Ok(())
    }

    async fn save_session(&self, session: &DiscoverySession) -> StoreResult<()> {
        self.check("discovery_sessions")?;
        self.tables
            .write()
            .unwrap()
            .sessions
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn run_cleanup(&self) -> StoreResult<u64> {
        self.check("auto_cleanup_discovered_urls")?;
        let mut tables = self.tables.write().unwrap();
        let before = tables.urls.len();
        tables.urls.retain(|_, url| {
            url.auto_clean_score < CLEANUP_THRESHOLD && url.status != UrlStatus::Blacklisted
        });
        Ok((before - tables.urls.len()) as u64)
    }
}
