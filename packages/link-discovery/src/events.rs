use serde::{Deserialize, Serialize};

use crate::types::{LinkType, QueueId, SessionId, UrlId};

/// Facts about what the orchestrator did, broadcast to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscoveryEvent {
    // ============================================================================
    // Queue events
    // ============================================================================
    RequestQueued {
        queue_id: QueueId,
        persisted: bool,
    },

    // ============================================================================
    // Session events
    // ============================================================================
    SessionStarted {
        session_id: SessionId,
        queue_id: QueueId,
    },

    AlgorithmCompleted {
        session_id: SessionId,
        algorithm: String,
        candidates: usize,
    },

    AlgorithmFailed {
        session_id: SessionId,
        algorithm: String,
        partial_candidates: usize,
        error: String,
    },

    UrlDiscovered {
        session_id: SessionId,
        url_id: UrlId,
        url: String,
        link_type: LinkType,
    },

    DuplicateSkipped {
        session_id: SessionId,
        url: String,
    },

    SessionCompleted {
        session_id: SessionId,
        total_urls_discovered: u32,
        verified_urls: u32,
        working_urls: u32,
    },

    SessionFailed {
        session_id: SessionId,
        error: String,
    },

    // ============================================================================
    // Maintenance events
    // ============================================================================
    CleanupCompleted {
        removed: u64,
    },
}

impl DiscoveryEvent {
    /// Session this event belongs to, if any
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            DiscoveryEvent::SessionStarted { session_id, .. }
            | DiscoveryEvent::AlgorithmCompleted { session_id, .. }
            | DiscoveryEvent::AlgorithmFailed { session_id, .. }
            | DiscoveryEvent::UrlDiscovered { session_id, .. }
            | DiscoveryEvent::DuplicateSkipped { session_id, .. }
            | DiscoveryEvent::SessionCompleted { session_id, .. }
            | DiscoveryEvent::SessionFailed { session_id, .. } => Some(*session_id),
            DiscoveryEvent::RequestQueued { .. } | DiscoveryEvent::CleanupCompleted { .. } => None,
        }
    }

    /// True for the event that closes a session
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DiscoveryEvent::SessionCompleted { .. } | DiscoveryEvent::SessionFailed { .. }
        )
    }
}
