//! # Domain Errors
//!
//! `EnrichmentError` describes a failed post-finalization fetch and never
//! changes the watch phase. `WatcherError` is what operations return and
//! what a failed observation ends with.

use shared_types::entities::EntityKind;
use shared_types::errors::TransportError;
use thiserror::Error;

/// A post-finalization fetch failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Fetching {kind} records failed after {pages_fetched} page(s): {cause}")]
pub struct EnrichmentError {
    /// Record kind being fetched.
    pub kind: EntityKind,
    /// Pages fetched before the failure.
    pub pages_fetched: usize,
    /// Transport failure.
    #[source]
    pub cause: TransportError,
}

/// Block watcher error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WatcherError {
    /// `start` was called without a network.
    #[error("Network identifier must not be empty")]
    InvalidNetwork,

    /// The configuration is unusable.
    #[error("Invalid watcher configuration: {0}")]
    InvalidConfig(String),

    /// The watcher was already started. Watchers are single-use.
    #[error("Watcher already started")]
    AlreadyStarted,

    /// A block-state or head feed failed before finalization.
    #[error("Block source failed: {0}")]
    Source(#[source] TransportError),

    /// The watcher was stopped before finalization.
    #[error("Watcher stopped")]
    Stopped,

    /// The network context was closed before any network was selected.
    #[error("Network context closed before a network was selected")]
    NetworkClosed,
}
