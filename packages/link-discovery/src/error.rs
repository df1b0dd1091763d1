//! Typed errors for link discovery.
//!
//! Internally every fallible step returns one of these. The orchestrator's
//! public methods turn them into logged, best-effort fallbacks.

use thiserror::Error;

use crate::types::UrlId;

/// Errors raised while running a discovery request.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Persistence layer failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A single discovery algorithm gave up
    #[error("algorithm {algorithm} failed: {reason}")]
    Algorithm {
        algorithm: &'static str,
        reason: String,
    },

    /// Orchestrator was built without any algorithms to fan out to
    #[error("no discovery algorithms registered")]
    NoAlgorithms,

    /// Candidate could not be parsed as an absolute URL with a host
    #[error("invalid candidate url: {url}")]
    InvalidUrl { url: String },

    /// The spawned discovery run panicked or was aborted
    #[error("discovery run aborted: {0}")]
    Aborted(String),
}

impl DiscoveryError {
    pub fn algorithm(algorithm: &'static str, reason: impl Into<String>) -> Self {
        Self::Algorithm {
            algorithm,
            reason: reason.into(),
        }
    }
}

/// Errors reported by a [`crate::DiscoveryStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Table or stored procedure does not exist (feature not deployed yet)
    #[error("schema object missing: {object}")]
    SchemaMissing { object: String },

    /// Row addressed by id does not exist
    #[error("url not found: {id}")]
    NotFound { id: UrlId },

    /// A URL with this address is already stored; carries the URL itself
    #[error("url already stored: {url}")]
    Duplicate { url: String },

    /// Backend could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other database failure
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    /// Row contents could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn schema_missing(object: impl Into<String>) -> Self {
        Self::SchemaMissing {
            object: object.into(),
        }
    }

    /// Table or procedure absent, or backend unreachable: callers route these
    /// to the demo fallback instead of treating them as failures.
    pub fn is_feature_unavailable(&self) -> bool {
        matches!(self, Self::SchemaMissing { .. } | Self::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            match db.code().as_deref() {
                // undefined_table / undefined_function
                Some("42P01") | Some("42883") => {
                    return Self::SchemaMissing {
                        object: db.message().to_string(),
                    }
                }
                _ => {}
            }
        }

        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(err.to_string())
            }
            other => Self::Database(other),
        }
    }
}

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
