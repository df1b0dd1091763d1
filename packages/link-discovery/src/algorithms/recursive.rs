use async_trait::async_trait;
use std::collections::HashSet;

use super::{keyword_slugs, SimulatedLatency};
use crate::error::Result;
use crate::traits::{AlgorithmContext, DiscoveryAlgorithm};
use crate::types::{DiscoveryRequest, LinkType};

/// Links kept per crawl level so fan-out stays bounded at any depth.
const FRONTIER_LIMIT: usize = 20;

/// Path segments a simulated page links out to.
const CHILD_SEGMENTS: &[&str] = &["members", "discussion", "resources", "blog", "community"];

/// Simulated depth-limited crawl starting from per-type seed pages.
#[derive(Debug, Clone)]
pub struct RecursiveCrawl {
    latency: SimulatedLatency,
}

impl RecursiveCrawl {
    pub fn new(latency: SimulatedLatency) -> Self {
        Self { latency }
    }

    fn seeds(slug: &str, link_type: LinkType) -> Vec<String> {
        match link_type {
            LinkType::BlogComment => vec![format!("https://{slug}-insights.com/blog")],
            LinkType::Web2Platform => vec![format!("https://{slug}.wordpress.com")],
            LinkType::ForumProfile => vec![
                format!("https://www.reddit.com/r/{slug}"),
                format!("https://forum.{slug}hub.net"),
            ],
            LinkType::SocialProfile => vec![format!("https://www.pinterest.com/search/{slug}")],
            LinkType::GuestPost => vec![format!("https://{slug}digest.com/write-for-us")],
            LinkType::ResourcePage => vec![format!("https://{slug}academy.org/resources")],
            LinkType::DirectoryListing => vec![format!("https://{slug}-directory.com/listings")],
        }
    }
}

#[async_trait]
impl DiscoveryAlgorithm for RecursiveCrawl {
    fn name(&self) -> &'static str {
        "recursive_crawl"
    }

    async fn discover(&self, request: &DiscoveryRequest, ctx: &mut AlgorithmContext) -> Result<()> {
        let depth = request.discovery_depth.min(ctx.max_depth);
        let mut visited = HashSet::new();
        let mut frontier = Vec::new();

        for slug in keyword_slugs(request) {
            for &link_type in request.allowed_link_types() {
                for seed in Self::seeds(&slug, link_type) {
                    if visited.insert(seed.clone()) {
                        ctx.push(seed.clone());
                        frontier.push(seed);
                    }
                }
            }
        }

        for level in 1..=depth {
            self.latency.wait(&mut ctx.rng).await;

            let fanout = if level == 1 { 3 } else { 2 };
            let mut next = Vec::new();

            for parent in frontier.iter().take(FRONTIER_LIMIT) {
                for _ in 0..fanout {
                    let segment = CHILD_SEGMENTS[ctx.rng.usize(..CHILD_SEGMENTS.len())];
                    let child = format!(
                        "{}/{}-{}",
                        parent.trim_end_matches('/'),
                        segment,
                        ctx.rng.u32(1..=999)
                    );
                    if visited.insert(child.clone()) {
                        ctx.push(child.clone());
                        next.push(child);
                    }
                }
            }

            tracing::debug!(level, discovered = next.len(), "Crawl level complete");
            frontier = next;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(depth: usize, max_depth: usize) -> Vec<String> {
        let crawl = RecursiveCrawl::new(SimulatedLatency::none());
        let request =
            DiscoveryRequest::new(vec!["seo".into()], vec![LinkType::ForumProfile]).with_depth(depth);
        let mut ctx = AlgorithmContext::new(fastrand::Rng::with_seed(1), max_depth);
        crawl.discover(&request, &mut ctx).await.unwrap();
        ctx.into_candidates()
    }

    #[tokio::test]
    async fn test_depth_zero_returns_only_seeds() {
        let urls = run(0, 3).await;
        assert_eq!(urls, vec!["https://www.reddit.com/r/seo", "https://forum.seohub.net"]);
    }

    #[tokio::test]
    async fn test_depth_is_capped_by_config() {
        let capped = run(50, 2).await;
        let exact = run(2, 2).await;
        assert_eq!(capped, exact);
    }

    #[tokio::test]
    async fn test_children_extend_their_parent() {
        let urls = run(1, 3).await;
        assert!(urls.len() > 2);
        for child in &urls[2..] {
            assert!(
                child.starts_with("https://www.reddit.com/r/seo/")
                    || child.starts_with("https://forum.seohub.net/"),
                "{child}"
            );
        }
    }
}
