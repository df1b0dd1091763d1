use async_trait::async_trait;

use super::{keyword_slugs, SimulatedLatency};
use crate::error::Result;
use crate::traits::{AlgorithmContext, DiscoveryAlgorithm};
use crate::types::DiscoveryRequest;

/// Hub URL templates; `{}` is replaced by the keyword slug.
const HUB_PATTERNS: &[&str] = &[
    "https://www.quora.com/topic/{}",
    "https://dev.to/t/{}",
    "https://{}.blogspot.com",
    "https://github.com/topics/{}",
    "https://www.yelp.com/search?find_desc={}",
    "https://{}-resources.org/useful-links",
    "https://{}directory.net/submit-site",
    "https://{}magazine.com/contribute",
];

/// Content hubs and aggregators that tend to accept contributions.
#[derive(Debug, Clone)]
pub struct ContentHubs {
    latency: SimulatedLatency,
}

impl ContentHubs {
    pub fn new(latency: SimulatedLatency) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl DiscoveryAlgorithm for ContentHubs {
    fn name(&self) -> &'static str {
        "content_hubs"
    }

    async fn discover(&self, request: &DiscoveryRequest, ctx: &mut AlgorithmContext) -> Result<()> {
        for slug in keyword_slugs(request) {
            self.latency.wait(&mut ctx.rng).await;
            for pattern in HUB_PATTERNS {
                ctx.push(pattern.replace("{}", &slug));
            }
        }

        Ok(())
    }
}
