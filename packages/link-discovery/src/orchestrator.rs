//! Discovery orchestrator: queue, single active session, fan-out and persistence.
//!
//! # Architecture
//!
//! ```text
//! request_discovery ──► FIFO queue ──► process_next (busy flag)
//!                                          │
//!                                          ├─► join_all(algorithms)
//!                                          ├─► merge + dedup + cap
//!                                          ├─► classify / score / accept
//!                                          └─► url_exists → insert_url
//! ```
//!
//! Every public read and write is best-effort: store failures are logged and
//! replaced by a fallback (demo data, manual aggregation, no-op). The `try_*`
//! methods underneath return `Result` so the degradation stays in one place.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::algorithms::default_algorithms;
use crate::classifier::{accept, classify_url_type, initial_status, score_candidate};
use crate::config::DiscoveryConfig;
use crate::demo::{demo_stats, demo_urls};
use crate::error::{DiscoveryError, Result, StoreError};
use crate::events::DiscoveryEvent;
use crate::traits::{AlgorithmContext, DiscoveryAlgorithm, DiscoveryStore};
use crate::types::*;

#[derive(Debug, Clone)]
struct QueuedRequest {
    queue_id: QueueId,
    request: DiscoveryRequest,
}

/// Clears the busy flag when a run ends, including by panic or early return.
struct BusyGuard(Arc<DiscoveryOrchestrator>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.is_discovering.store(false, Ordering::Release);
    }
}

pub struct DiscoveryOrchestrator {
    store: Arc<dyn DiscoveryStore>,
    algorithms: Vec<Arc<dyn DiscoveryAlgorithm>>,
    config: DiscoveryConfig,
    queue: Mutex<VecDeque<QueuedRequest>>,
    active_session: RwLock<Option<DiscoverySession>>,
    is_discovering: AtomicBool,
    events: broadcast::Sender<DiscoveryEvent>,
    rng: Mutex<fastrand::Rng>,
}

impl DiscoveryOrchestrator {
    pub fn new(
        store: Arc<dyn DiscoveryStore>,
        algorithms: Vec<Arc<dyn DiscoveryAlgorithm>>,
        config: DiscoveryConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let rng = config.new_rng();

        Self {
            store,
            algorithms,
            config,
            queue: Mutex::new(VecDeque::new()),
            active_session: RwLock::new(None),
            is_discovering: AtomicBool::new(false),
            events,
            rng: Mutex::new(rng),
        }
    }

    /// Orchestrator running the five built-in algorithms.
    pub fn with_default_algorithms(store: Arc<dyn DiscoveryStore>, config: DiscoveryConfig) -> Self {
        let algorithms = default_algorithms(&config);
        Self::new(store, algorithms, config)
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Receive every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DiscoveryEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the current (or most recent) session.
    pub async fn active_session(&self) -> Option<DiscoverySession> {
        self.active_session.read().await.clone()
    }

    pub async fn queue_len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub fn is_discovering(&self) -> bool {
        self.is_discovering.load(Ordering::Acquire)
    }

    fn emit(&self, event: DiscoveryEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // ========================================================================
    // QUEUE
    // ========================================================================

    /// Queue a request and return its tracking id without waiting for execution.
    pub async fn request_discovery(&self, request: DiscoveryRequest) -> QueueId {
        let queue_id = QueueId::new();

        self.queue.lock().await.push_back(QueuedRequest {
            queue_id,
            request: request.clone(),
        });

        let persisted = match self.store.enqueue_request(queue_id, &request).await {
            Ok(()) => true,
            Err(e) => {
                log_store_error("enqueue_request", &e);
                false
            }
        };

        info!(
            queue_id = %queue_id,
            keywords = ?request.keywords,
            link_types = request.link_types.len(),
            priority = request.priority,
            persisted,
            "discovery request queued"
        );
        self.emit(DiscoveryEvent::RequestQueued { queue_id, persisted });

        queue_id
    }

    /// Run the oldest queued request to completion.
    ///
    /// Returns `None` when the queue is empty or another run holds the busy flag.
    /// Dropping the returned future detaches the run; it still finishes its
    /// bookkeeping and holds the busy flag until then.
    pub async fn process_next(self: &Arc<Self>) -> Option<SessionId> {
        if self
            .is_discovering
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("discovery already running, skipping tick");
            return None;
        }
        let busy = BusyGuard(Arc::clone(self));

        let next = self.queue.lock().await.pop_front()?;

        // The task owns the guard, so the flag stays set until the session is saved
        let run = tokio::spawn(async move {
            let session_id = busy.0.execute(next).await;
            drop(busy);
            session_id
        });
        match run.await {
            Ok(session_id) => Some(session_id),
            Err(e) => {
                error!(error = %e, "discovery run aborted");
                None
            }
        }
    }

    async fn mark_queue(&self, queue_id: QueueId, status: QueueStatus) {
        if let Err(e) = self.store.update_queue_status(queue_id, status).await {
            log_store_error("update_queue_status", &e);
        }
    }

    // ========================================================================
    // SESSION EXECUTION
    // ========================================================================

    async fn execute(self: &Arc<Self>, queued: QueuedRequest) -> SessionId {
        let QueuedRequest { queue_id, request } = queued;

        let session = DiscoverySession::start(queue_id, &request);
        let session_id = session.id;
        *self.active_session.write().await = Some(session);

        info!(session_id = %session_id, queue_id = %queue_id, "discovery session started");
        self.emit(DiscoveryEvent::SessionStarted { session_id, queue_id });
        self.mark_queue(queue_id, QueueStatus::Processing).await;

        // Spawned so a panicking algorithm fails the session instead of the loop
        let this = Arc::clone(self);
        let outcome = match tokio::spawn(async move { this.run_session(session_id, request).await }).await {
            Ok(result) => result,
            Err(join_error) => Err(DiscoveryError::Aborted(join_error.to_string())),
        };

        let finished = {
            let mut active = self.active_session.write().await;
            match active.as_mut().filter(|s| s.id == session_id) {
                Some(session) => {
                    match &outcome {
                        Ok(()) => session.complete(),
                        Err(e) => session.fail(e.to_string()),
                    }
                    Some(session.clone())
                }
                None => None,
            }
        };

        match &outcome {
            Ok(()) => {
                let (total, verified, working) = finished
                    .as_ref()
                    .map(|s| (s.total_urls_discovered, s.verified_urls, s.working_urls))
                    .unwrap_or_default();
                info!(
                    session_id = %session_id,
                    total_urls_discovered = total,
                    verified_urls = verified,
                    working_urls = working,
                    "discovery session completed"
                );
                self.emit(DiscoveryEvent::SessionCompleted {
                    session_id,
                    total_urls_discovered: total,
                    verified_urls: verified,
                    working_urls: working,
                });
                self.mark_queue(queue_id, QueueStatus::Completed).await;
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "discovery session failed");
                self.emit(DiscoveryEvent::SessionFailed {
                    session_id,
                    error: e.to_string(),
                });
                self.mark_queue(queue_id, QueueStatus::Failed).await;
            }
        }

        if let Some(session) = finished {
            if let Err(e) = self.store.save_session(&session).await {
                log_store_error("save_session", &e);
            }
        }

        session_id
    }

    async fn run_session(&self, session_id: SessionId, request: DiscoveryRequest) -> Result<()> {
        if self.algorithms.is_empty() {
            return Err(DiscoveryError::NoAlgorithms);
        }

        let mut rng = self.rng.lock().await.fork();

        let runs: Vec<_> = self
            .algorithms
            .iter()
            .map(|algorithm| {
                let mut ctx = AlgorithmContext::new(rng.fork(), self.config.max_depth);
                let algorithm = Arc::clone(algorithm);
                let request = &request;
                async move {
                    let result = algorithm.discover(request, &mut ctx).await;
                    (algorithm.name(), result, ctx.into_candidates())
                }
            })
            .collect();

        let mut outputs = Vec::with_capacity(runs.len());
        for (name, result, candidates) in join_all(runs).await {
            match result {
                Ok(()) => {
                    debug!(session_id = %session_id, algorithm = name, candidates = candidates.len(), "algorithm finished");
                    self.emit(DiscoveryEvent::AlgorithmCompleted {
                        session_id,
                        algorithm: name.to_string(),
                        candidates: candidates.len(),
                    });
                }
                Err(e) => {
                    warn!(
                        session_id = %session_id,
                        algorithm = name,
                        partial_candidates = candidates.len(),
                        error = %e,
                        "algorithm failed, keeping partial output"
                    );
                    self.emit(DiscoveryEvent::AlgorithmFailed {
                        session_id,
                        algorithm: name.to_string(),
                        partial_candidates: candidates.len(),
                        error: e.to_string(),
                    });
                }
            }
            outputs.push((name, candidates));
        }

        let cap = request
            .max_results
            .map_or(self.config.merge_cap, |max| max.min(self.config.merge_cap));
        let merged = merge_candidates(outputs, cap);
        debug!(session_id = %session_id, merged = merged.len(), cap, "candidates merged");

        let keywords = serde_json::Value::from(request.keywords.clone());
        for (url, discovered_by) in merged {
            let classification = classify_url_type(&url, request.allowed_link_types(), &mut rng);
            let scores = score_candidate(&url, classification.link_type, &mut rng);
            if !accept(&scores, self.config.max_spam_score) {
                debug!(url = %url, spam_score = scores.spam_score, "candidate rejected");
                continue;
            }

            let status = initial_status(&scores);
            let mut record = DiscoveredUrl::new(&url, classification.link_type, scores, status, discovered_by)
                .with_metadata("session_id", session_id.to_string())
                .with_metadata("keywords", keywords.clone())
                .with_metadata(
                    "classification",
                    if classification.is_fallback() { "fallback" } else { "keyword" },
                );
            if let Some(keyword) = classification.matched_keyword {
                record = record.with_metadata("matched_keyword", keyword);
            }

            let url_id = match self.try_store_url(&record).await {
                Ok(id) => id,
                Err(StoreError::Duplicate { url }) => {
                    debug!(session_id = %session_id, url = %url, "duplicate url skipped");
                    self.emit(DiscoveryEvent::DuplicateSkipped { session_id, url });
                    continue;
                }
                Err(e) => {
                    log_store_error("insert_url", &e);
                    record.id
                }
            };

            if let Some(session) = self.active_session.write().await.as_mut().filter(|s| s.id == session_id) {
                session.record(status);
            }

            self.emit(DiscoveryEvent::UrlDiscovered {
                session_id,
                url_id,
                url: record.url,
                link_type: record.link_type,
            });
        }

        Ok(())
    }

    /// Existence check, then insert. The store's unique constraint has the final say.
    async fn try_store_url(&self, record: &DiscoveredUrl) -> std::result::Result<UrlId, StoreError> {
        match self.store.url_exists(&record.url).await {
            Ok(true) => {
                return Err(StoreError::Duplicate {
                    url: record.url.clone(),
                })
            }
            Ok(false) => {}
            Err(e) => log_store_error("url_exists", &e),
        }

        self.store.insert_url(record).await
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Discovered URLs, newest first. Never fails; degrades to the demo feed.
    pub async fn get_discovered_urls(
        &self,
        link_type: Option<LinkType>,
        status: Option<UrlStatus>,
        limit: usize,
        offset: usize,
    ) -> Vec<DiscoveredUrl> {
        let filter = UrlFilter {
            link_type,
            status,
            limit,
            offset,
        };

        if self.config.serve_demo_feed {
            return demo_urls(&filter);
        }

        match self.try_list_urls(&filter).await {
            Ok(urls) => urls,
            Err(e) => {
                log_degraded("list_urls", &e);
                demo_urls(&filter)
            }
        }
    }

    async fn try_list_urls(&self, filter: &UrlFilter) -> Result<Vec<DiscoveredUrl>> {
        Ok(self.store.list_urls(filter).await?)
    }

    /// Aggregate stats: stored procedure, then manual aggregation, then demo stats.
    pub async fn get_discovery_stats(&self) -> DiscoveryStats {
        match self.try_discovery_stats().await {
            Ok(stats) => stats,
            Err(e) => {
                log_degraded("discovery_stats", &e);
                demo_stats()
            }
        }
    }

    async fn try_discovery_stats(&self) -> Result<DiscoveryStats> {
        match self.store.fetch_stats().await {
            Ok(stats) => return Ok(stats),
            Err(e) => log_store_error("fetch_stats", &e),
        }

        let urls = self.store.list_urls(&UrlFilter::everything()).await?;
        Ok(DiscoveryStats::from_urls(&urls))
    }

    // ========================================================================
    // COMMUNITY SIGNALS
    // ========================================================================

    /// Count one vote and record the contribution. Never fails.
    pub async fn vote_on_url(&self, url_id: UrlId, direction: VoteDirection, user_id: Option<Uuid>) {
        match self.try_vote(url_id, direction, user_id).await {
            Ok(()) => debug!(url_id = %url_id, ?direction, "vote recorded"),
            Err(e) => log_degraded("vote_on_url", &e),
        }
    }

    async fn try_vote(&self, url_id: UrlId, direction: VoteDirection, user_id: Option<Uuid>) -> Result<()> {
        self.store.record_vote(url_id, direction).await?;
        self.store
            .record_contribution(&Contribution::new(user_id, url_id, direction.into()))
            .await?;
        Ok(())
    }

    /// Count one report, add the auto-clean penalty and record the contribution. Never fails.
    pub async fn report_url(&self, url_id: UrlId, reason: &str, user_id: Option<Uuid>) {
        match self.try_report(url_id, reason, user_id).await {
            Ok(()) => info!(url_id = %url_id, reason, "url reported"),
            Err(e) => log_degraded("report_url", &e),
        }
    }

    async fn try_report(&self, url_id: UrlId, reason: &str, user_id: Option<Uuid>) -> Result<()> {
        self.store
            .record_report(url_id, reason, self.config.report_penalty)
            .await?;
        self.store
            .record_contribution(&Contribution::new(user_id, url_id, ContributionKind::Report).with_reason(reason))
            .await?;
        Ok(())
    }

    /// Relabel a URL. Never fails.
    pub async fn update_url_status(&self, url_id: UrlId, status: UrlStatus) {
        match self.store.update_url_status(url_id, status).await {
            Ok(()) => debug!(url_id = %url_id, status = %status, "url status updated"),
            Err(e) => log_store_error("update_url_status", &e),
        }
    }

    // ========================================================================
    // MAINTENANCE
    // ========================================================================

    /// Run the store's cleanup procedure. Returns rows removed, or `None` if it failed.
    pub async fn run_cleanup(&self) -> Option<u64> {
        match self.store.run_cleanup().await {
            Ok(removed) => {
                info!(removed, "auto cleanup completed");
                self.emit(DiscoveryEvent::CleanupCompleted { removed });
                Some(removed)
            }
            Err(e) => {
                log_store_error("run_cleanup", &e);
                None
            }
        }
    }
}

/// Union algorithm outputs taking one candidate per algorithm in turn, keeping
/// the first finder, until `cap` unique URLs are collected.
fn merge_candidates(outputs: Vec<(&'static str, Vec<String>)>, cap: usize) -> Vec<(Url, &'static str)> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    let mut sources: Vec<_> = outputs
        .into_iter()
        .map(|(name, candidates)| (name, candidates.into_iter()))
        .collect();

    while merged.len() < cap && !sources.is_empty() {
        sources.retain_mut(|(name, candidates)| {
            if merged.len() >= cap {
                return true;
            }
            let Some(raw) = candidates.next() else {
                return false;
            };
            match parse_candidate(&raw) {
                Ok(url) => {
                    if seen.insert(url.as_str().to_string()) {
                        merged.push((url, *name));
                    }
                }
                Err(e) => debug!(algorithm = *name, error = %e, "candidate dropped"),
            }
            true
        });
    }

    merged
}

fn parse_candidate(raw: &str) -> Result<Url> {
    let invalid = || DiscoveryError::InvalidUrl { url: raw.to_string() };
    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(url)
}

fn log_store_error(operation: &'static str, err: &StoreError) {
    if err.is_feature_unavailable() {
        info!(operation, error = %err, "store feature unavailable, degrading");
    } else {
        warn!(operation, error = %err, "store operation failed, degrading");
    }
}

fn log_degraded(operation: &'static str, err: &DiscoveryError) {
    match err {
        DiscoveryError::Store(store_error) => log_store_error(operation, store_error),
        other => warn!(operation, error = %other, "operation failed, degrading"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryDiscoveryStore;
    use crate::traits::MockDiscoveryStore;
    use async_trait::async_trait;

    struct FixedUrls {
        name: &'static str,
        urls: Vec<&'static str>,
        fail: bool,
    }

    #[async_trait]
    impl DiscoveryAlgorithm for FixedUrls {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn discover(&self, _request: &DiscoveryRequest, ctx: &mut AlgorithmContext) -> Result<()> {
            for url in &self.urls {
                ctx.push(*url);
            }
            if self.fail {
                return Err(DiscoveryError::algorithm(self.name, "upstream timed out"));
            }
            Ok(())
        }
    }

    struct Panicking;

    #[async_trait]
    impl DiscoveryAlgorithm for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn discover(&self, _request: &DiscoveryRequest, _ctx: &mut AlgorithmContext) -> Result<()> {
            panic!("algorithm blew up");
        }
    }

    fn config() -> DiscoveryConfig {
        DiscoveryConfig::default()
            .without_latency()
            .with_seed(7)
            .with_max_spam_score(100)
    }

    fn forum_request() -> DiscoveryRequest {
        DiscoveryRequest::new(vec!["seo".into()], vec![LinkType::ForumProfile])
    }

    fn stored_url(url: &str, status: UrlStatus) -> DiscoveredUrl {
        DiscoveredUrl::new(
            &Url::parse(url).unwrap(),
            LinkType::ForumProfile,
            QualityScores {
                domain_authority: 60,
                page_authority: 50,
                spam_score: 5,
                success_rate: 80,
            },
            status,
            "test",
        )
    }

    #[test]
    fn test_merge_dedups_in_first_seen_order_and_caps() {
        let outputs: Vec<(&'static str, Vec<String>)> = vec![
            ("a", vec!["https://one.example.com/".into(), "not a url".into(), "https://two.example.com/".into()]),
            ("b", vec!["https://one.example.com/".into(), "ftp://files.example.com/".into(), "https://three.example.com/".into()]),
        ];

        let merged = merge_candidates(outputs.clone(), 10);
        let urls: Vec<_> = merged.iter().map(|(u, name)| (u.as_str(), *name)).collect();
        assert_eq!(
            urls,
            vec![
                ("https://one.example.com/", "a"),
                ("https://two.example.com/", "a"),
                ("https://three.example.com/", "b"),
            ]
        );

        assert_eq!(merge_candidates(outputs, 2).len(), 2);
    }

    #[test]
    fn test_merge_interleaves_algorithms_before_capping() {
        let outputs: Vec<(&'static str, Vec<String>)> = vec![
            ("crawl", (1..=5).map(|i| format!("https://crawl.example.com/{i}")).collect()),
            ("social", (1..=2).map(|i| format!("https://social.example.com/{i}")).collect()),
        ];

        let merged = merge_candidates(outputs.clone(), 4);
        let urls: Vec<_> = merged.iter().map(|(u, name)| (u.as_str(), *name)).collect();
        assert_eq!(
            urls,
            vec![
                ("https://crawl.example.com/1", "crawl"),
                ("https://social.example.com/1", "social"),
                ("https://crawl.example.com/2", "crawl"),
                ("https://social.example.com/2", "social"),
            ]
        );

        // Shorter outputs run dry and the rest fill the remaining slots
        let all = merge_candidates(outputs.clone(), 50);
        assert_eq!(all.len(), 7);
        assert_eq!(all.last().map(|(u, _)| u.as_str()), Some("https://crawl.example.com/5"));

        assert!(merge_candidates(outputs, 0).is_empty());
    }

    #[tokio::test]
    async fn test_failing_algorithm_keeps_partial_output() {
        let store = Arc::new(MemoryDiscoveryStore::new());
        let algorithms: Vec<Arc<dyn DiscoveryAlgorithm>> = vec![
            Arc::new(FixedUrls {
                name: "flaky",
                urls: vec!["https://forum.example.com/members/a"],
                fail: true,
            }),
            Arc::new(FixedUrls {
                name: "steady",
                urls: vec!["https://forum.example.com/members/b"],
                fail: false,
            }),
        ];
        let orchestrator = Arc::new(DiscoveryOrchestrator::new(store.clone(), algorithms, config()));
        let mut events = orchestrator.subscribe();

        orchestrator.request_discovery(forum_request()).await;
        orchestrator.process_next().await.unwrap();

        let session = orchestrator.active_session().await.unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.total_urls_discovered, 2);
        assert_eq!(store.url_count(), 2);

        let mut failed = 0;
        while let Ok(event) = events.try_recv() {
            if let DiscoveryEvent::AlgorithmFailed { algorithm, partial_candidates, .. } = event {
                assert_eq!(algorithm, "flaky");
                assert_eq!(partial_candidates, 1);
                failed += 1;
            }
        }
        assert_eq!(failed, 1);
    }

    #[tokio::test]
    async fn test_panicking_algorithm_fails_session_and_releases_flag() {
        let store = Arc::new(MemoryDiscoveryStore::new());
        let orchestrator = Arc::new(DiscoveryOrchestrator::new(
            store.clone(),
            vec![Arc::new(Panicking)],
            config(),
        ));

        let queue_id = orchestrator.request_discovery(forum_request()).await;
        orchestrator.process_next().await.unwrap();

        let session = orchestrator.active_session().await.unwrap();
        assert_eq!(session.status, SessionStatus::Failed);
        assert!(session.error.is_some());
        assert!(!orchestrator.is_discovering());
        assert_eq!(store.queue_entries(), vec![(queue_id, QueueStatus::Failed)]);
    }

    #[tokio::test]
    async fn test_no_algorithms_fails_session() {
        let orchestrator = Arc::new(DiscoveryOrchestrator::new(
            Arc::new(MemoryDiscoveryStore::new()),
            Vec::new(),
            config(),
        ));

        orchestrator.request_discovery(forum_request()).await;
        orchestrator.process_next().await.unwrap();

        let session = orchestrator.active_session().await.unwrap();
        assert_eq!(session.status, SessionStatus::Failed);
        assert_eq!(session.error.as_deref(), Some("no discovery algorithms registered"));
    }

    #[tokio::test]
    async fn test_busy_flag_skips_tick() {
        let orchestrator = Arc::new(DiscoveryOrchestrator::with_default_algorithms(
            Arc::new(MemoryDiscoveryStore::new()),
            config(),
        ));
        orchestrator.request_discovery(forum_request()).await;

        orchestrator.is_discovering.store(true, Ordering::Release);
        assert!(orchestrator.process_next().await.is_none());
        assert_eq!(orchestrator.queue_len().await, 1);

        orchestrator.is_discovering.store(false, Ordering::Release);
        assert!(orchestrator.process_next().await.is_some());
        assert_eq!(orchestrator.queue_len().await, 0);
    }

    #[tokio::test]
    async fn test_empty_queue_returns_none() {
        let orchestrator = Arc::new(DiscoveryOrchestrator::with_default_algorithms(
            Arc::new(MemoryDiscoveryStore::new()),
            config(),
        ));
        assert!(orchestrator.process_next().await.is_none());
        assert!(!orchestrator.is_discovering());
        assert!(orchestrator.active_session().await.is_none());
    }

    #[tokio::test]
    async fn test_stats_use_stored_procedure_first() {
        let mut store = MockDiscoveryStore::new();
        let expected = DiscoveryStats::from_urls(&[stored_url("https://a.example.com/", UrlStatus::Working)]);
        let returned = expected.clone();
        store.expect_fetch_stats().times(1).returning(move || Ok(returned.clone()));
        store.expect_list_urls().never();

        let orchestrator = DiscoveryOrchestrator::new(Arc::new(store), Vec::new(), config());
        assert_eq!(orchestrator.get_discovery_stats().await, expected);
    }

    #[tokio::test]
    async fn test_stats_fall_back_to_manual_aggregation() {
        let mut store = MockDiscoveryStore::new();
        store
            .expect_fetch_stats()
            .returning(|| Err(StoreError::schema_missing("get_discovery_stats")));
        store.expect_list_urls().times(1).returning(|_| {
            Ok(vec![
                stored_url("https://a.example.com/", UrlStatus::Working),
                stored_url("https://b.example.com/", UrlStatus::Broken),
            ])
        });

        let orchestrator = DiscoveryOrchestrator::new(Arc::new(store), Vec::new(), config());
        let stats = orchestrator.get_discovery_stats().await;
        assert_eq!(stats.total_urls, 2);
        assert_eq!(stats.working_urls, 1);
        assert_eq!(stats.broken_urls, 1);
    }

    #[tokio::test]
    async fn test_stats_fall_back_to_demo() {
        let mut store = MockDiscoveryStore::new();
        store
            .expect_fetch_stats()
            .returning(|| Err(StoreError::schema_missing("get_discovery_stats")));
        store
            .expect_list_urls()
            .returning(|_| Err(StoreError::schema_missing("discovered_urls")));

        let orchestrator = DiscoveryOrchestrator::new(Arc::new(store), Vec::new(), config());
        assert_eq!(orchestrator.get_discovery_stats().await, demo_stats());
    }

    #[tokio::test]
    async fn test_vote_error_is_swallowed_and_skips_contribution() {
        let mut store = MockDiscoveryStore::new();
        store
            .expect_record_vote()
            .times(1)
            .returning(|id, _| Err(StoreError::NotFound { id }));
        store.expect_record_contribution().never();

        let orchestrator = DiscoveryOrchestrator::new(Arc::new(store), Vec::new(), config());
        orchestrator.vote_on_url(UrlId::new(), VoteDirection::Up, None).await;
    }

    #[tokio::test]
    async fn test_report_applies_penalty_and_records_reason() {
        let url_id = UrlId::new();
        let user = Uuid::now_v7();

        let mut store = MockDiscoveryStore::new();
        store
            .expect_record_report()
            .withf(move |id, reason, penalty| *id == url_id && reason == "spam" && *penalty == 10)
            .times(1)
            .returning(|_, _, _| Ok(()));
        store
            .expect_record_contribution()
            .withf(move |c| {
                c.url_id == url_id
                    && c.user_id == Some(user)
                    && c.kind == ContributionKind::Report
                    && c.reason.as_deref() == Some("spam")
            })
            .times(1)
            .returning(|_| Ok(()));

        let orchestrator = DiscoveryOrchestrator::new(Arc::new(store), Vec::new(), config());
        orchestrator.report_url(url_id, "spam", Some(user)).await;
    }

    #[tokio::test]
    async fn test_contribution_failure_is_swallowed() {
        let mut store = MockDiscoveryStore::new();
        store.expect_record_vote().returning(|_, _| Ok(()));
        store
            .expect_record_contribution()
            .returning(|_| Err(StoreError::schema_missing("user_contributions")));

        let orchestrator = DiscoveryOrchestrator::new(Arc::new(store), Vec::new(), config());
        orchestrator.vote_on_url(UrlId::new(), VoteDirection::Down, None).await;
    }

    #[tokio::test]
    async fn test_cleanup_failure_returns_none() {
        let mut store = MockDiscoveryStore::new();
        store
            .expect_run_cleanup()
            .returning(|| Err(StoreError::Unavailable("connection refused".into())));

        let orchestrator = DiscoveryOrchestrator::new(Arc::new(store), Vec::new(), config());
        assert_eq!(orchestrator.run_cleanup().await, None);
    }

    #[tokio::test]
    async fn test_insert_failure_still_counts_url() {
        let mut store = MockDiscoveryStore::new();
        store.expect_enqueue_request().returning(|_, _| Ok(()));
        store.expect_update_queue_status().returning(|_, _| Ok(()));
        store.expect_url_exists().returning(|_| Ok(false));
        store
            .expect_insert_url()
            .returning(|_| Err(StoreError::Unavailable("pool timed out".into())));
        store.expect_save_session().returning(|_| Ok(()));

        let algorithms: Vec<Arc<dyn DiscoveryAlgorithm>> = vec![Arc::new(FixedUrls {
            name: "fixed",
            urls: vec!["https://forum.example.com/members/x"],
            fail: false,
        })];
        let orchestrator = Arc::new(DiscoveryOrchestrator::new(Arc::new(store), algorithms, config()));

        orchestrator.request_discovery(forum_request()).await;
        orchestrator.process_next().await.unwrap();

        let session = orchestrator.active_session().await.unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.total_urls_discovered, 1);
    }
}
