//! Link-type classification and simulated quality scoring.
//!
//! Classification is a keyword heuristic over the lowercased host and path.
//! Scores stand in for third-party SEO metrics and are generated, not measured.

use url::Url;

use crate::types::{LinkType, QualityScores, UrlStatus};

/// Keyword patterns checked against `host + path`, per link type.
fn patterns(link_type: LinkType) -> &'static [&'static str] {
    match link_type {
        LinkType::BlogComment => &["blog", "comment", "/post/", "/article"],
        LinkType::Web2Platform => &[
            "wordpress.com",
            "blogspot",
            "tumblr",
            "medium.com",
            "weebly",
            "wixsite",
            "substack",
        ],
        LinkType::ForumProfile => &[
            "forum", "reddit", "quora", "community", "discuss", "board", "/members/",
        ],
        LinkType::SocialProfile => &[
            "twitter", "facebook", "linkedin", "instagram", "pinterest", "/user/", "/@", "profile",
        ],
        LinkType::GuestPost => &[
            "write-for-us",
            "guest-post",
            "contribute",
            "submit-article",
            "contributor",
        ],
        LinkType::ResourcePage => &["resources", "useful-links", "/links", "tools", "/library"],
        LinkType::DirectoryListing => &[
            "directory", "listing", "yelp", "yellowpages", "/business", "catalog",
        ],
    }
}

/// Outcome of [`classify_url_type`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub link_type: LinkType,
    /// Pattern that decided the type; `None` means the random fallback was used.
    pub matched_keyword: Option<&'static str>,
}

impl Classification {
    pub fn is_fallback(&self) -> bool {
        self.matched_keyword.is_none()
    }
}

/// Deterministic part of classification: first requested type with a matching pattern.
pub fn match_url_type(url: &Url, allowed: &[LinkType]) -> Option<Classification> {
    let haystack = format!(
        "{}{}",
        url.host_str().unwrap_or_default(),
        url.path()
    )
    .to_lowercase();

    allowed.iter().find_map(|&link_type| {
        patterns(link_type)
            .iter()
            .find(|pattern| haystack.contains(*pattern))
            .map(|pattern| Classification {
                link_type,
                matched_keyword: Some(*pattern),
            })
    })
}

/// Classify a candidate URL against the caller's requested link types.
///
/// Falls back to a random pick from `allowed` (all types when empty) when no
/// pattern matches. The fallback is arbitrary and callers should surface it.
pub fn classify_url_type(url: &Url, allowed: &[LinkType], rng: &mut fastrand::Rng) -> Classification {
    let allowed: &[LinkType] = if allowed.is_empty() {
        &LinkType::ALL
    } else {
        allowed
    };

    if let Some(classification) = match_url_type(url, allowed) {
        return classification;
    }

    Classification {
        link_type: allowed[rng.usize(..allowed.len())],
        matched_keyword: None,
    }
}

/// Well-known platforms and their (approximate) domain authority.
const KNOWN_AUTHORITY: &[(&str, u8)] = &[
    ("medium.com", 95),
    ("wordpress.com", 94),
    ("reddit.com", 91),
    ("quora.com", 93),
    ("linkedin.com", 98),
    ("pinterest.com", 94),
    ("tumblr.com", 89),
    ("blogspot.com", 89),
    ("github.com", 96),
    ("dev.to", 82),
    ("yelp.com", 93),
    ("substack.com", 88),
    ("weebly.com", 86),
];

fn known_authority(host: &str) -> Option<u8> {
    KNOWN_AUTHORITY
        .iter()
        .find(|(domain, _)| host == *domain || host.ends_with(&format!(".{domain}")))
        .map(|(_, da)| *da)
}

fn baseline_success(link_type: LinkType) -> u8 {
    match link_type {
        LinkType::Web2Platform => 80,
        LinkType::SocialProfile => 75,
        LinkType::ForumProfile => 70,
        LinkType::DirectoryListing => 65,
        LinkType::BlogComment => 55,
        LinkType::ResourcePage => 45,
        LinkType::GuestPost => 40,
    }
}

fn saturating_count(count: usize) -> u8 {
    u8::try_from(count).unwrap_or(u8::MAX)
}

/// Generate simulated quality scores for a classified candidate.
pub fn score_candidate(url: &Url, link_type: LinkType, rng: &mut fastrand::Rng) -> QualityScores {
    let host = url.host_str().unwrap_or_default().to_lowercase();

    let domain_authority = known_authority(&host).unwrap_or_else(|| rng.u8(20..=70));
    let page_authority = domain_authority.saturating_sub(rng.u8(0..=15));

    // Long hyphenated or digit-heavy hosts read as spammy.
    let hyphens = saturating_count(host.matches('-').count());
    let digits = saturating_count(host.chars().filter(|c| c.is_ascii_digit()).count());
    let structural = hyphens.saturating_mul(8).saturating_add(digits.saturating_mul(5));
    let spam_base = if known_authority(&host).is_some() {
        rng.u8(0..=10)
    } else {
        rng.u8(0..=40)
    };
    let spam_score = spam_base.saturating_add(structural).min(100);

    let jitter = rng.i16(-15..=15);
    let success_rate = (i16::from(baseline_success(link_type)) + jitter).clamp(0, 100) as u8;

    QualityScores {
        domain_authority: domain_authority.min(100),
        page_authority: page_authority.min(100),
        spam_score,
        success_rate,
    }
}

/// Initial workflow label derived from the scores.
pub fn initial_status(scores: &QualityScores) -> UrlStatus {
    if scores.spam_score < 30 && scores.success_rate >= 70 {
        UrlStatus::Working
    } else if scores.spam_score < 50 {
        UrlStatus::Verified
    } else {
        UrlStatus::Pending
    }
}

/// Validation gate applied before a candidate is persisted.
pub fn accept(scores: &QualityScores, max_spam_score: u8) -> bool {
    scores.spam_score <= max_spam_score
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_forum_keywords_classify_as_forum_profile() {
        let mut rng = fastrand::Rng::with_seed(1);
        for candidate in [
            "https://www.reddit.com/r/seo",
            "https://www.quora.com/topic/SEO",
            "https://forum.example.org/threads/1",
        ] {
            let c = classify_url_type(&url(candidate), &[LinkType::ForumProfile], &mut rng);
            assert_eq!(c.link_type, LinkType::ForumProfile, "{candidate}");
            assert!(!c.is_fallback());
        }
    }

    #[test]
    fn test_first_requested_type_wins() {
        // Matches both the blog and the web2 patterns.
        let candidate = url("https://seo-blog.wordpress.com/");
        let mut rng = fastrand::Rng::with_seed(1);

        let web2_first = classify_url_type(
            &candidate,
            &[LinkType::Web2Platform, LinkType::BlogComment],
            &mut rng,
        );
        assert_eq!(web2_first.link_type, LinkType::Web2Platform);

        let blog_first = classify_url_type(
            &candidate,
            &[LinkType::BlogComment, LinkType::Web2Platform],
            &mut rng,
        );
        assert_eq!(blog_first.link_type, LinkType::BlogComment);
    }

    #[test]
    fn test_fallback_stays_within_allowed_types() {
        let candidate = url("https://example.net/nothing-to-see");
        let allowed = [LinkType::GuestPost, LinkType::ResourcePage];
        let mut rng = fastrand::Rng::with_seed(7);

        for _ in 0..50 {
            let c = classify_url_type(&candidate, &allowed, &mut rng);
            assert!(c.is_fallback());
            assert!(allowed.contains(&c.link_type));
        }
    }

    #[test]
    fn test_empty_allowed_falls_back_to_all_types() {
        let mut rng = fastrand::Rng::with_seed(3);
        let c = classify_url_type(&url("https://example.net/"), &[], &mut rng);
        assert!(LinkType::ALL.contains(&c.link_type));
    }

    #[test]
    fn test_scores_stay_in_range() {
        let mut rng = fastrand::Rng::with_seed(11);
        for candidate in [
            "https://medium.com/@seo",
            "https://best-cheap-seo-links-4-u-2024.biz/",
            "https://example.com/resources",
        ] {
            for link_type in LinkType::ALL {
                let scores = score_candidate(&url(candidate), link_type, &mut rng);
                assert!(scores.domain_authority <= 100);
                assert!(scores.page_authority <= scores.domain_authority);
                assert!(scores.spam_score <= 100);
                assert!(scores.success_rate <= 100);
            }
        }
    }

    #[test]
    fn test_structural_counts_saturate() {
        assert_eq!(saturating_count(12), 12);
        assert_eq!(saturating_count(255), 255);
        assert_eq!(saturating_count(256), u8::MAX);
        assert_eq!(saturating_count(100_000), u8::MAX);
    }

    #[test]
    fn test_hyphen_heavy_host_scores_as_spam() {
        let host = format!("https://{}.example.com/", "a-".repeat(30) + "a");
        let mut rng = fastrand::Rng::with_seed(5);
        let scores = score_candidate(&url(&host), LinkType::DirectoryListing, &mut rng);
        assert_eq!(scores.spam_score, 100);
    }

    #[test]
    fn test_known_platforms_use_table_authority() {
        let mut rng = fastrand::Rng::with_seed(5);
        let scores = score_candidate(&url("https://www.reddit.com/user/seo"), LinkType::ForumProfile, &mut rng);
        assert_eq!(scores.domain_authority, 91);
    }

    #[test]
    fn test_initial_status_thresholds() {
        let mut scores = QualityScores {
            domain_authority: 50,
            page_authority: 40,
            spam_score: 10,
            success_rate: 90,
        };
        assert_eq!(initial_status(&scores), UrlStatus::Working);

        scores.success_rate = 50;
        assert_eq!(initial_status(&scores), UrlStatus::Verified);

        scores.spam_score = 55;
        assert_eq!(initial_status(&scores), UrlStatus::Pending);
        assert!(accept(&scores, 60));
        assert!(!accept(&scores, 50));
    }

    proptest! {
        #[test]
        fn prop_keyword_match_is_deterministic(slug in "[a-z]{1,12}", seed in any::<u64>()) {
            let candidate = url(&format!("https://www.reddit.com/user/{slug}"));
            let allowed = [LinkType::SocialProfile, LinkType::ForumProfile];

            let mut rng_a = fastrand::Rng::with_seed(seed);
            let mut rng_b = fastrand::Rng::with_seed(seed.wrapping_add(1));
            let a = classify_url_type(&candidate, &allowed, &mut rng_a);
            let b = classify_url_type(&candidate, &allowed, &mut rng_b);

            prop_assert_eq!(a, b);
            prop_assert!(!a.is_fallback());
        }
    }
}
