//! Built-in demo feed served when the store is absent or the feed is pinned to demo data.

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::types::*;

/// (url, link type, DA, PA, spam, success, status, upvotes, downvotes, reports)
type DemoRow = (&'static str, LinkType, u8, u8, u8, u8, UrlStatus, u32, u32, u32);

const DEMO_ROWS: &[DemoRow] = &[
    ("https://www.reddit.com/r/SEO/", LinkType::ForumProfile, 91, 78, 4, 88, UrlStatus::Working, 42, 3, 0),
    ("https://www.quora.com/topic/Search-Engine-Optimization-SEO", LinkType::ForumProfile, 93, 70, 6, 81, UrlStatus::Working, 35, 2, 1),
    ("https://community.hubspot.com/t5/SEO/bd-p/seo", LinkType::ForumProfile, 88, 61, 12, 72, UrlStatus::Verified, 18, 1, 0),
    ("https://medium.com/@seo-insights", LinkType::Web2Platform, 95, 66, 8, 85, UrlStatus::Working, 27, 1, 0),
    ("https://seo-notes.wordpress.com/", LinkType::Web2Platform, 94, 48, 15, 79, UrlStatus::Verified, 11, 0, 0),
    ("https://www.searchenginejournal.com/blog/link-building-guide/#comments", LinkType::BlogComment, 91, 64, 9, 58, UrlStatus::Verified, 14, 2, 0),
    ("https://backlinko.com/blog/seo-techniques#comments", LinkType::BlogComment, 84, 59, 11, 52, UrlStatus::Pending, 6, 3, 2),
    ("https://www.linkedin.com/company/seo-community", LinkType::SocialProfile, 98, 72, 3, 90, UrlStatus::Working, 22, 0, 0),
    ("https://www.pinterest.com/seotips/", LinkType::SocialProfile, 94, 55, 7, 76, UrlStatus::Working, 9, 1, 0),
    ("https://marketingland-digest.com/write-for-us", LinkType::GuestPost, 62, 41, 28, 38, UrlStatus::Pending, 4, 4, 1),
    ("https://www.contentmarketinginstitute.com/contribute/", LinkType::GuestPost, 81, 57, 10, 44, UrlStatus::Verified, 13, 1, 0),
    ("https://moz.com/resources/seo-tools", LinkType::ResourcePage, 91, 63, 5, 47, UrlStatus::Verified, 19, 0, 0),
    ("https://seo-academy.org/useful-links", LinkType::ResourcePage, 47, 30, 34, 41, UrlStatus::Broken, 1, 5, 3),
    ("https://www.yelp.com/biz/local-seo-agency", LinkType::DirectoryListing, 93, 52, 6, 68, UrlStatus::Working, 8, 1, 0),
    ("https://marketing-directory.com/listings/seo", LinkType::DirectoryListing, 38, 22, 45, 63, UrlStatus::RateLimited, 2, 6, 4),
];

/// Fixed demo timestamp (2024-06-01T00:00:00Z) offset by `hours`.
fn demo_time(hours: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_717_200_000 + hours * 3600, 0).unwrap_or_default()
}

/// The full demo dataset, newest first, with stable ids.
pub fn demo_dataset() -> Vec<DiscoveredUrl> {
    DEMO_ROWS
        .iter()
        .enumerate()
        .map(|(i, &(raw, link_type, da, pa, spam, success, status, upvotes, downvotes, reports))| {
            let age = i as i64;
            DiscoveredUrl {
                id: UrlId(Uuid::from_u128(0xde30_0000_0000_0000_0000_0000_0000_0000 + i as u128)),
                url: raw.to_string(),
                domain: url::Url::parse(raw)
                    .ok()
                    .and_then(|u| u.host_str().map(str::to_string))
                    .unwrap_or_default(),
                link_type,
                domain_authority: da,
                page_authority: pa,
                spam_score: spam,
                success_rate: success,
                status,
                upvotes,
                downvotes,
                reports,
                auto_clean_score: reports * 10,
                discovered_by: "demo".to_string(),
                discovered_at: demo_time(-age * 6),
                last_verified: status.is_verified().then(|| demo_time(-age * 6 + 1)),
                metadata: json!({ "demo": true }),
            }
        })
        .collect()
}

/// Demo rows matching `filter`, after offset and limit.
pub fn demo_urls(filter: &UrlFilter) -> Vec<DiscoveredUrl> {
    demo_dataset()
        .into_iter()
        .filter(|url| filter.matches(url))
        .skip(filter.offset)
        .take(filter.limit)
        .collect()
}

/// Stats over the demo dataset.
pub fn demo_stats() -> DiscoveryStats {
    DiscoveryStats::from_urls(&demo_dataset())
}
