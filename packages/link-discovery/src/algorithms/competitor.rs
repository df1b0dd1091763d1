use async_trait::async_trait;

use super::{keyword_slugs, SimulatedLatency};
use crate::error::Result;
use crate::traits::{AlgorithmContext, DiscoveryAlgorithm};
use crate::types::{DiscoveryRequest, LinkType};

/// Stand-ins for sites that rank for the requested keywords.
const COMPETITOR_DOMAINS: &[&str] = &[
    "searchenginejournal.com",
    "moz.com",
    "backlinko.com",
    "neilpatel.com",
    "ahrefs.com",
];

/// Simulated lookup of pages linking to competing sites.
#[derive(Debug, Clone)]
pub struct CompetitorBacklinks {
    latency: SimulatedLatency,
}

impl CompetitorBacklinks {
    pub fn new(latency: SimulatedLatency) -> Self {
        Self { latency }
    }

    fn backlink_path(slug: &str, link_type: LinkType) -> String {
        match link_type {
            LinkType::BlogComment => format!("/blog/{slug}-guide#comments"),
            LinkType::Web2Platform => format!("/{slug}-tips"),
            LinkType::ForumProfile => format!("/community/members/{slug}"),
            LinkType::SocialProfile => format!("/profile/{slug}"),
            LinkType::GuestPost => "/write-for-us".to_string(),
            LinkType::ResourcePage => format!("/resources/{slug}"),
            LinkType::DirectoryListing => format!("/directory/{slug}"),
        }
    }
}

#[async_trait]
impl DiscoveryAlgorithm for CompetitorBacklinks {
    fn name(&self) -> &'static str {
        "competitor_backlinks"
    }

    async fn discover(&self, request: &DiscoveryRequest, ctx: &mut AlgorithmContext) -> Result<()> {
        for slug in keyword_slugs(request) {
            self.latency.wait(&mut ctx.rng).await;

            // Each keyword surfaces a different subset of competitors.
            let picks = ctx.rng.usize(2..=COMPETITOR_DOMAINS.len());
            let offset = ctx.rng.usize(..COMPETITOR_DOMAINS.len());

            for i in 0..picks {
                let domain = COMPETITOR_DOMAINS[(offset + i) % COMPETITOR_DOMAINS.len()];
                for &link_type in request.allowed_link_types() {
                    ctx.push(format!(
                        "https://{domain}{}",
                        Self::backlink_path(&slug, link_type)
                    ));
                }
            }
        }

        Ok(())
    }
}
