//! Backlink opportunity discovery.
//!
//! A [`DiscoveryOrchestrator`] owns a FIFO queue of [`DiscoveryRequest`]s and
//! runs them one at a time: each request fans out to every registered
//! [`DiscoveryAlgorithm`], the candidates are merged, classified, scored and
//! persisted through a [`DiscoveryStore`]. Reads and community signals are
//! best-effort and fall back to a built-in demo feed.

pub mod algorithms;
pub mod classifier;
pub mod config;
pub mod demo;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod storage;
pub mod traits;
pub mod types;
pub mod worker;

pub use config::{Config, DiscoveryConfig};
pub use error::{DiscoveryError, Result, StoreError, StoreResult};
pub use events::DiscoveryEvent;
pub use orchestrator::DiscoveryOrchestrator;
pub use storage::{MemoryDiscoveryStore, PostgresDiscoveryStore};
pub use traits::{AlgorithmContext, DiscoveryAlgorithm, DiscoveryStore};
pub use types::*;
pub use worker::DiscoveryWorker;
