use async_trait::async_trait;

use crate::error::{Result, StoreResult};
use crate::types::*;

// ============================================================================
// STORE: Persistence (advisory, best-effort)
// ============================================================================

/// Backing store for discovered URLs, the request queue and contributions.
///
/// A missing table or procedure is reported as `StoreError::SchemaMissing`;
/// the orchestrator treats that as "feature not deployed" rather than failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiscoveryStore: Send + Sync {
    // Queue (the caller generates the id so the in-memory entry and the row agree)
    async fn enqueue_request(&self, id: QueueId, request: &DiscoveryRequest) -> StoreResult<()>;

    async fn update_queue_status(&self, id: QueueId, status: QueueStatus) -> StoreResult<()>;

    // Discovered URLs (unique by url)
    async fn url_exists(&self, url: &str) -> StoreResult<bool>;

    async fn insert_url(&self, url: &DiscoveredUrl) -> StoreResult<UrlId>;

    async fn list_urls(&self, filter: &UrlFilter) -> StoreResult<Vec<DiscoveredUrl>>;

    async fn update_url_status(&self, id: UrlId, status: UrlStatus) -> StoreResult<()>;

    // Aggregates
    async fn fetch_stats(&self) -> StoreResult<DiscoveryStats>;

    // Community signals
    async fn record_vote(&self, id: UrlId, direction: VoteDirection) -> StoreResult<()>;

    async fn record_report(&self, id: UrlId, reason: &str, penalty: u32) -> StoreResult<()>;

    async fn record_contribution(&self, contribution: &Contribution) -> StoreResult<()>;

    // Sessions
    async fn save_session(&self, session: &DiscoverySession) -> StoreResult<()>;

    // Maintenance
    async fn run_cleanup(&self) -> StoreResult<u64>;
}

// ============================================================================
// ALGORITHM: Candidate generation (pluggable strategy)
// ============================================================================

/// Per-algorithm scratch space: a candidate sink and its own RNG.
///
/// Candidates pushed before an error are kept, so a failing algorithm still
/// contributes its partial output.
#[derive(Debug)]
pub struct AlgorithmContext {
    candidates: Vec<String>,
    pub rng: fastrand::Rng,
    pub max_depth: usize,
}

impl AlgorithmContext {
    pub fn new(rng: fastrand::Rng, max_depth: usize) -> Self {
        Self {
            candidates: Vec::new(),
            rng,
            max_depth,
        }
    }

    pub fn push(&mut self, url: impl Into<String>) {
        self.candidates.push(url.into());
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn into_candidates(self) -> Vec<String> {
        self.candidates
    }
}

/// One independent way of finding candidate URLs for a request.
#[async_trait]
pub trait DiscoveryAlgorithm: Send + Sync {
    /// Recorded as `discovered_by` on URLs this algorithm found first
    fn name(&self) -> &'static str;

    async fn discover(&self, request: &DiscoveryRequest, ctx: &mut AlgorithmContext) -> Result<()>;
}
