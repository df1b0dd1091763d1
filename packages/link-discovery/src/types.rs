use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Unique identifier for a discovered URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlId(pub Uuid);

impl UrlId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for UrlId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UrlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique identifier for a discovery session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Tracking id handed back by `request_discovery`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueId(pub Uuid);

impl QueueId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for QueueId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// ENUMS (type-safe states)
// ============================================================================

/// Structural category of a backlink opportunity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    BlogComment,
    Web2Platform,
    ForumProfile,
    SocialProfile,
    GuestPost,
    ResourcePage,
    DirectoryListing,
}

impl LinkType {
    pub const ALL: [LinkType; 7] = [
        LinkType::BlogComment,
        LinkType::Web2Platform,
        LinkType::ForumProfile,
        LinkType::SocialProfile,
        LinkType::GuestPost,
        LinkType::ResourcePage,
        LinkType::DirectoryListing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::BlogComment => "blog_comment",
            LinkType::Web2Platform => "web2_platform",
            LinkType::ForumProfile => "forum_profile",
            LinkType::SocialProfile => "social_profile",
            LinkType::GuestPost => "guest_post",
            LinkType::ResourcePage => "resource_page",
            LinkType::DirectoryListing => "directory_listing",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LinkType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Workflow label for a discovered URL. No transitions are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlStatus {
    Pending,
    Verified,
    Working,
    Broken,
    Blacklisted,
    RateLimited,
}

impl UrlStatus {
    pub const ALL: [UrlStatus; 6] = [
        UrlStatus::Pending,
        UrlStatus::Verified,
        UrlStatus::Working,
        UrlStatus::Broken,
        UrlStatus::Blacklisted,
        UrlStatus::RateLimited,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UrlStatus::Pending => "pending",
            UrlStatus::Verified => "verified",
            UrlStatus::Working => "working",
            UrlStatus::Broken => "broken",
            UrlStatus::Blacklisted => "blacklisted",
            UrlStatus::RateLimited => "rate_limited",
        }
    }

    /// Working URLs have also passed verification.
    pub fn is_verified(&self) -> bool {
        matches!(self, UrlStatus::Verified | UrlStatus::Working)
    }
}

impl fmt::Display for UrlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UrlStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UrlStatus::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }
}

/// Status of a row in the persistent discovery queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Queued => "queued",
            QueueStatus::Processing => "processing",
            QueueStatus::Completed => "completed",
            QueueStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionKind {
    Upvote,
    Downvote,
    Report,
}

impl ContributionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionKind::Upvote => "upvote",
            ContributionKind::Downvote => "downvote",
            ContributionKind::Report => "report",
        }
    }
}

impl From<VoteDirection> for ContributionKind {
    fn from(direction: VoteDirection) -> Self {
        match direction {
            VoteDirection::Up => ContributionKind::Upvote,
            VoteDirection::Down => ContributionKind::Downvote,
        }
    }
}

/// A stored label that does not name any known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant: {0}")]
pub struct UnknownVariant(pub String);

// ============================================================================
// CORE TYPES
// ============================================================================

/// Simulated quality scores, each clamped to 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    pub domain_authority: u8,
    pub page_authority: u8,
    pub spam_score: u8,
    pub success_rate: u8,
}

/// A candidate backlink opportunity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredUrl {
    pub id: UrlId,
    pub url: String,
    pub domain: String,
    pub link_type: LinkType,
    pub domain_authority: u8,
    pub page_authority: u8,
    pub spam_score: u8,
    pub success_rate: u8,
    pub status: UrlStatus,
    pub upvotes: u32,
    pub downvotes: u32,
    pub reports: u32,
    pub auto_clean_score: u32,
    pub discovered_by: String,
    pub discovered_at: DateTime<Utc>,
    pub last_verified: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
}

impl DiscoveredUrl {
    pub fn new(
        url: &Url,
        link_type: LinkType,
        scores: QualityScores,
        status: UrlStatus,
        discovered_by: impl Into<String>,
    ) -> Self {
        Self {
            id: UrlId::new(),
            url: url.to_string(),
            domain: url.host_str().unwrap_or_default().to_string(),
            link_type,
            domain_authority: scores.domain_authority,
            page_authority: scores.page_authority,
            spam_score: scores.spam_score,
            success_rate: scores.success_rate,
            status,
            upvotes: 0,
            downvotes: 0,
            reports: 0,
            auto_clean_score: 0,
            discovered_by: discovered_by.into(),
            discovered_at: Utc::now(),
            last_verified: status.is_verified().then(Utc::now),
            metadata: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        if let serde_json::Value::Object(map) = &mut self.metadata {
            map.insert(key.to_string(), value.into());
        }
        self
    }
}

/// Caller-supplied discovery job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub keywords: Vec<String>,
    pub link_types: Vec<LinkType>,
    pub discovery_depth: usize,
    pub priority: i32,
    pub max_results: Option<usize>,
    pub requested_by: Option<Uuid>,
}

impl DiscoveryRequest {
    pub fn new(keywords: Vec<String>, link_types: Vec<LinkType>) -> Self {
        Self {
            keywords,
            link_types,
            discovery_depth: 1,
            priority: 0,
            max_results: None,
            requested_by: None,
        }
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.discovery_depth = depth;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn requested_by(mut self, user_id: Uuid) -> Self {
        self.requested_by = Some(user_id);
        self
    }

    /// Link types a candidate may be classified as. Empty means all of them.
    pub fn allowed_link_types(&self) -> &[LinkType] {
        if self.link_types.is_empty() {
            &LinkType::ALL
        } else {
            &self.link_types
        }
    }
}

/// One execution of a discovery request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverySession {
    pub id: SessionId,
    pub queue_id: QueueId,
    pub target_keywords: Vec<String>,
    pub target_link_types: Vec<LinkType>,
    pub total_urls_discovered: u32,
    pub verified_urls: u32,
    pub working_urls: u32,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl DiscoverySession {
    pub fn start(queue_id: QueueId, request: &DiscoveryRequest) -> Self {
        Self {
            id: SessionId::new(),
            queue_id,
            target_keywords: request.keywords.clone(),
            target_link_types: request.link_types.clone(),
            total_urls_discovered: 0,
            verified_urls: 0,
            working_urls: 0,
            status: SessionStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
            error: None,
        }
    }

    /// Count one accepted URL against the session totals.
    pub fn record(&mut self, status: UrlStatus) {
        self.total_urls_discovered += 1;
        if status.is_verified() {
            self.verified_urls += 1;
        }
        if status == UrlStatus::Working {
            self.working_urls += 1;
        }
    }

    pub fn complete(&mut self) {
        self.status = SessionStatus::Completed;
        self.ended_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = SessionStatus::Failed;
        self.error = Some(error.into());
        self.ended_at = Some(Utc::now());
    }

    /// Fraction of discovered URLs that are working; 0 when nothing was found.
    pub fn success_rate(&self) -> f64 {
        if self.total_urls_discovered == 0 {
            0.0
        } else {
            f64::from(self.working_urls) / f64::from(self.total_urls_discovered)
        }
    }
}

/// Per-user contribution row written on vote / report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub user_id: Option<Uuid>,
    pub url_id: UrlId,
    pub kind: ContributionKind,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Contribution {
    pub fn new(user_id: Option<Uuid>, url_id: UrlId, kind: ContributionKind) -> Self {
        Self {
            user_id,
            url_id,
            kind,
            reason: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Filter + pagination for reading discovered URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlFilter {
    pub link_type: Option<LinkType>,
    pub status: Option<UrlStatus>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for UrlFilter {
    fn default() -> Self {
        Self {
            link_type: None,
            status: None,
            limit: 50,
            offset: 0,
        }
    }
}

impl UrlFilter {
    pub fn matches(&self, url: &DiscoveredUrl) -> bool {
        self.link_type.map_or(true, |t| url.link_type == t)
            && self.status.map_or(true, |s| url.status == s)
    }

    /// Unbounded filter used for manual aggregation.
    pub fn everything() -> Self {
        Self {
            limit: usize::MAX,
            ..Self::default()
        }
    }
}

// ============================================================================
// STATS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryStats {
    pub total_urls: u64,
    pub verified_urls: u64,
    pub working_urls: u64,
    pub broken_urls: u64,
    pub average_domain_authority: f64,
    pub average_success_rate: f64,
    pub by_link_type: BTreeMap<LinkType, u64>,
    pub by_status: BTreeMap<UrlStatus, u64>,
    pub total_upvotes: u64,
    pub total_reports: u64,
    pub last_discovered_at: Option<DateTime<Utc>>,
}

impl DiscoveryStats {
    /// Aggregate stats by walking stored rows.
    pub fn from_urls(urls: &[DiscoveredUrl]) -> Self {
        let mut by_link_type = BTreeMap::new();
        let mut by_status = BTreeMap::new();
        let mut da_sum = 0u64;
        let mut success_sum = 0u64;
        let mut total_upvotes = 0u64;
        let mut total_reports = 0u64;

        for url in urls {
            *by_link_type.entry(url.link_type).or_insert(0) += 1;
            *by_status.entry(url.status).or_insert(0) += 1;
            da_sum += u64::from(url.domain_authority);
            success_sum += u64::from(url.success_rate);
            total_upvotes += u64::from(url.upvotes);
            total_reports += u64::from(url.reports);
        }

        let total = urls.len() as u64;
        let average = |sum: u64| if total == 0 { 0.0 } else { sum as f64 / total as f64 };
        let count = |status: UrlStatus| by_status.get(&status).copied().unwrap_or(0);

        Self {
            total_urls: total,
            verified_urls: count(UrlStatus::Verified) + count(UrlStatus::Working),
            working_urls: count(UrlStatus::Working),
            broken_urls: count(UrlStatus::Broken),
            average_domain_authority: average(da_sum),
            average_success_rate: average(success_sum),
            by_link_type,
            by_status,
            total_upvotes,
            total_reports,
            last_discovered_at: urls.iter().map(|u| u.discovered_at).max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_with(status: UrlStatus, link_type: LinkType, da: u8) -> DiscoveredUrl {
        let parsed = Url::parse("https://forum.example.com/members/seo").unwrap();
        DiscoveredUrl::new(
            &parsed,
            link_type,
            QualityScores {
                domain_authority: da,
                page_authority: da,
                spam_score: 10,
                success_rate: 80,
            },
            status,
            "test",
        )
    }

    #[test]
    fn test_link_type_round_trips_through_str() {
        for link_type in LinkType::ALL {
            assert_eq!(link_type.as_str().parse::<LinkType>().unwrap(), link_type);
        }
        assert!("carrier_pigeon".parse::<LinkType>().is_err());
    }

    #[test]
    fn test_link_type_serializes_snake_case() {
        let json = serde_json::to_string(&LinkType::DirectoryListing).unwrap();
        assert_eq!(json, "\"directory_listing\"");
    }

    #[test]
    fn test_discovered_url_derives_domain() {
        let url = url_with(UrlStatus::Pending, LinkType::ForumProfile, 40);
        assert_eq!(url.domain, "forum.example.com");
        assert!(url.last_verified.is_none());
    }

    #[test]
    fn test_session_success_rate_zero_when_empty() {
        let request = DiscoveryRequest::new(vec!["seo".into()], vec![LinkType::GuestPost]);
        let session = DiscoverySession::start(QueueId::new(), &request);
        assert_eq!(session.success_rate(), 0.0);
    }

    #[test]
    fn test_session_counters_keep_ordering() {
        let request = DiscoveryRequest::new(vec!["seo".into()], vec![]);
        let mut session = DiscoverySession::start(QueueId::new(), &request);
        session.record(UrlStatus::Working);
        session.record(UrlStatus::Verified);
        session.record(UrlStatus::Pending);
        session.record(UrlStatus::Working);
        session.complete();

        assert_eq!(session.total_urls_discovered, 4);
        assert_eq!(session.verified_urls, 3);
        assert_eq!(session.working_urls, 2);
        assert!(session.working_urls <= session.verified_urls);
        assert!(session.verified_urls <= session.total_urls_discovered);
        assert_eq!(session.success_rate(), 0.5);
        assert_eq!(session.status, SessionStatus::Completed);
        assert!(session.ended_at.is_some());
    }

    #[test]
    fn test_empty_link_types_allow_everything() {
        let request = DiscoveryRequest::new(vec![], vec![]);
        assert_eq!(request.allowed_link_types(), &LinkType::ALL);
    }

    #[test]
    fn test_stats_from_urls() {
        let urls = vec![
            url_with(UrlStatus::Working, LinkType::ForumProfile, 80),
            url_with(UrlStatus::Verified, LinkType::ForumProfile, 60),
            url_with(UrlStatus::Broken, LinkType::GuestPost, 40),
        ];
        let stats = DiscoveryStats::from_urls(&urls);

        assert_eq!(stats.total_urls, 3);
        assert_eq!(stats.verified_urls, 2);
        assert_eq!(stats.working_urls, 1);
        assert_eq!(stats.broken_urls, 1);
        assert_eq!(stats.average_domain_authority, 60.0);
        assert_eq!(stats.by_link_type[&LinkType::ForumProfile], 2);
        assert!(stats.last_discovered_at.is_some());
    }

    #[test]
    fn test_stats_from_no_urls() {
        let stats = DiscoveryStats::from_urls(&[]);
        assert_eq!(stats.total_urls, 0);
        assert_eq!(stats.average_success_rate, 0.0);
        assert!(stats.last_discovered_at.is_none());
    }
}
