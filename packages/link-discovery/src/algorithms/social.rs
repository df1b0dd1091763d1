use async_trait::async_trait;

use super::{keyword_slugs, SimulatedLatency};
use crate::error::Result;
use crate::traits::{AlgorithmContext, DiscoveryAlgorithm};
use crate::types::{DiscoveryRequest, LinkType};

/// Profile URL templates; `{}` is replaced by the keyword slug.
const PLATFORMS: &[(LinkType, &str)] = &[
    (LinkType::SocialProfile, "https://twitter.com/{}"),
    (LinkType::SocialProfile, "https://www.linkedin.com/company/{}"),
    (LinkType::SocialProfile, "https://www.pinterest.com/{}"),
    (LinkType::SocialProfile, "https://www.facebook.com/{}"),
    (LinkType::ForumProfile, "https://www.reddit.com/user/{}"),
    (LinkType::ForumProfile, "https://www.quora.com/profile/{}"),
    (LinkType::Web2Platform, "https://medium.com/@{}"),
    (LinkType::Web2Platform, "https://{}.tumblr.com"),
    (LinkType::Web2Platform, "https://{}.substack.com"),
];

/// Enumerates well-known social and community platforms for each keyword.
#[derive(Debug, Clone)]
pub struct SocialPlatforms {
    latency: SimulatedLatency,
}

impl SocialPlatforms {
    pub fn new(latency: SimulatedLatency) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl DiscoveryAlgorithm for SocialPlatforms {
    fn name(&self) -> &'static str {
        "social_platforms"
    }

    async fn discover(&self, request: &DiscoveryRequest, ctx: &mut AlgorithmContext) -> Result<()> {
        self.latency.wait(&mut ctx.rng).await;

        let allowed = request.allowed_link_types();
        // Requests for unrelated types still get the social profiles.
        let wanted: Vec<_> = PLATFORMS
            .iter()
            .filter(|(link_type, _)| allowed.contains(link_type))
            .collect();
        let platforms = if wanted.is_empty() {
            PLATFORMS.iter().collect()
        } else {
            wanted
        };

        for slug in keyword_slugs(request) {
            for (_, template) in &platforms {
                ctx.push(template.replace("{}", &slug));
            }
        }

        Ok(())
    }
}
