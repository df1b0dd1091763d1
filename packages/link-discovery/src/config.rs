use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Tuning knobs for the orchestrator and its background loop
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// How often the worker checks the queue
    pub poll_interval: Duration,
    /// How often the best-effort cleanup procedure runs
    pub cleanup_interval: Duration,
    /// Merged candidates kept per request before classification
    pub merge_cap: usize,
    /// Upper bound on `discovery_depth`
    pub max_depth: usize,
    /// Auto-clean score added per report
    pub report_penalty: u32,
    /// Candidates scoring above this spam score are rejected
    pub max_spam_score: u8,
    /// Simulated network latency range for the built-in algorithms
    pub min_latency: Duration,
    pub max_latency: Duration,
    /// Serve the built-in demo feed from `get_discovered_urls`
    pub serve_demo_feed: bool,
    /// Fixed seed for classification / scoring randomness
    pub rng_seed: Option<u64>,
    pub event_capacity: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            cleanup_interval: Duration::from_secs(30 * 60),
            merge_cap: 50,
            max_depth: 3,
            report_penalty: 10,
            max_spam_score: 60,
            min_latency: Duration::from_millis(50),
            max_latency: Duration::from_millis(200),
            serve_demo_feed: true,
            rng_seed: None,
            event_capacity: 256,
        }
    }
}

impl DiscoveryConfig {
    /// Read `DISCOVERY_*` overrides on top of the defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(ms) = env_parse::<u64>("DISCOVERY_POLL_INTERVAL_MS")? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = env_parse::<u64>("DISCOVERY_CLEANUP_INTERVAL_SECS")? {
            config.cleanup_interval = Duration::from_secs(secs);
        }
        if let Some(cap) = env_parse("DISCOVERY_MERGE_CAP")? {
            config.merge_cap = cap;
        }
        if let Some(depth) = env_parse("DISCOVERY_MAX_DEPTH")? {
            config.max_depth = depth;
        }
        if let Some(penalty) = env_parse("DISCOVERY_REPORT_PENALTY")? {
            config.report_penalty = penalty;
        }
        if let Some(spam) = env_parse("DISCOVERY_MAX_SPAM_SCORE")? {
            config.max_spam_score = spam;
        }
        if let Some(demo) = env_parse("DISCOVERY_SERVE_DEMO_FEED")? {
            config.serve_demo_feed = demo;
        }
        config.rng_seed = env_parse("DISCOVERY_RNG_SEED")?;

        Ok(config)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn with_merge_cap(mut self, cap: usize) -> Self {
        self.merge_cap = cap;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_latency(mut self, min: Duration, max: Duration) -> Self {
        self.min_latency = min;
        self.max_latency = max.max(min);
        self
    }

    /// No simulated network delay; used by tests.
    pub fn without_latency(self) -> Self {
        self.with_latency(Duration::ZERO, Duration::ZERO)
    }

    pub fn with_demo_feed(mut self, enabled: bool) -> Self {
        self.serve_demo_feed = enabled;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_max_spam_score(mut self, max: u8) -> Self {
        self.max_spam_score = max;
        self
    }

    pub fn with_report_penalty(mut self, penalty: u32) -> Self {
        self.report_penalty = penalty;
        self
    }

    pub(crate) fn new_rng(&self) -> fastrand::Rng {
        match self.rng_seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        }
    }
}

/// Process configuration for the `discovery_worker` binary
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub discovery: DiscoveryConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
            discovery: DiscoveryConfig::from_env()?,
        })
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .with_context(|| format!("{key} must be a valid value, got {raw:?}")),
        Err(_) => Ok(None),
    }
}
