use async_trait::async_trait;

use super::{keyword_slugs, SimulatedLatency};
use crate::error::Result;
use crate::traits::{AlgorithmContext, DiscoveryAlgorithm};
use crate::types::{DiscoveryRequest, LinkType};

const DOMAIN_SUFFIXES: &[&str] = &["hub", "insider", "weekly", "pro", "central", "daily"];
const TLDS: &[&str] = &["com", "net", "org", "io"];

/// Pattern-based "suggestions": plausible niche sites built from the keywords.
#[derive(Debug, Clone)]
pub struct AiSuggestions {
    latency: SimulatedLatency,
    per_keyword: usize,
}

impl AiSuggestions {
    pub fn new(latency: SimulatedLatency) -> Self {
        Self {
            latency,
            per_keyword: 4,
        }
    }

    pub fn with_per_keyword(mut self, per_keyword: usize) -> Self {
        self.per_keyword = per_keyword;
        self
    }

    fn landing_path(link_type: LinkType) -> &'static str {
        match link_type {
            LinkType::BlogComment => "/blog/latest-post",
            LinkType::Web2Platform => "/",
            LinkType::ForumProfile => "/forum/register",
            LinkType::SocialProfile => "/profile/create",
            LinkType::GuestPost => "/guest-post-guidelines",
            LinkType::ResourcePage => "/useful-links",
            LinkType::DirectoryListing => "/business/add-listing",
        }
    }
}

#[async_trait]
impl DiscoveryAlgorithm for AiSuggestions {
    fn name(&self) -> &'static str {
        "ai_suggestions"
    }

    async fn discover(&self, request: &DiscoveryRequest, ctx: &mut AlgorithmContext) -> Result<()> {
        self.latency.wait(&mut ctx.rng).await;

        let allowed = request.allowed_link_types();
        for slug in keyword_slugs(request) {
            for _ in 0..self.per_keyword {
                let suffix = DOMAIN_SUFFIXES[ctx.rng.usize(..DOMAIN_SUFFIXES.len())];
                let tld = TLDS[ctx.rng.usize(..TLDS.len())];
                let link_type = allowed[ctx.rng.usize(..allowed.len())];
                ctx.push(format!(
                    "https://{slug}{suffix}.{tld}{}",
                    Self::landing_path(link_type)
                ));
            }
        }

        Ok(())
    }
}
