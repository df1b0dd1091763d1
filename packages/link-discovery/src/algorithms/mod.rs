//! Candidate generators fanned out by the orchestrator.
//!
//! The built-in algorithms are simulations: they wait for a configured latency
//! and build URLs from templates. Real implementations (HTTP fetch + link
//! extraction) plug in through [`DiscoveryAlgorithm`].

pub mod ai_suggestions;
pub mod competitor;
pub mod content_hub;
pub mod recursive;
pub mod social;

use std::sync::Arc;
use std::time::Duration;

pub use ai_suggestions::AiSuggestions;
pub use competitor::CompetitorBacklinks;
pub use content_hub::ContentHubs;
pub use recursive::RecursiveCrawl;
pub use social::SocialPlatforms;

use crate::config::DiscoveryConfig;
use crate::traits::DiscoveryAlgorithm;
use crate::types::DiscoveryRequest;

/// Keywords used when a request carries none.
const DEFAULT_KEYWORDS: &[&str] = &["seo", "marketing"];

/// Simulated network delay, sampled uniformly per call.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedLatency {
    pub min: Duration,
    pub max: Duration,
}

impl SimulatedLatency {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub async fn wait(&self, rng: &mut fastrand::Rng) {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        if max == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(rng.u64(min..=max))).await;
    }
}

impl From<&DiscoveryConfig> for SimulatedLatency {
    fn from(config: &DiscoveryConfig) -> Self {
        Self::new(config.min_latency, config.max_latency)
    }
}

/// The five built-in algorithms, in fan-out order.
pub fn default_algorithms(config: &DiscoveryConfig) -> Vec<Arc<dyn DiscoveryAlgorithm>> {
    let latency = SimulatedLatency::from(config);
    vec![
        Arc::new(RecursiveCrawl::new(latency)),
        Arc::new(CompetitorBacklinks::new(latency)),
        Arc::new(AiSuggestions::new(latency)),
        Arc::new(SocialPlatforms::new(latency)),
        Arc::new(ContentHubs::new(latency)),
    ]
}

/// Lowercase, hyphen-separated form of a keyword for use in hosts and paths.
pub(crate) fn slugify(keyword: &str) -> String {
    keyword
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Slugified request keywords, falling back to generic seeds.
pub(crate) fn keyword_slugs(request: &DiscoveryRequest) -> Vec<String> {
    let slugs: Vec<String> = request
        .keywords
        .iter()
        .map(|k| slugify(k))
        .filter(|s| !s.is_empty())
        .collect();

    if slugs.is_empty() {
        DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
    } else {
        slugs
    }
}
