//! # Error Types
//!
//! Errors raised by transport collaborators. Subsystems wrap these in their
//! own typed errors (`FetchError`, `SubscriptionError`, `EnrichmentError`).

use crate::entities::{EntityKind, NetworkId};
use thiserror::Error;

/// Failure reported by a paged query, a live feed or a state source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The remote call failed.
    #[error("RPC failure: {0}")]
    Rpc(String),

    /// The connection carrying a live feed was lost.
    #[error("Disconnected: {0}")]
    Disconnected(String),

    /// The transport has no connection for this network.
    #[error("Unknown network: {0}")]
    UnknownNetwork(NetworkId),

    /// The page key was not issued by this transport.
    #[error("Invalid page key: {0}")]
    InvalidPageKey(String),

    /// The transport cannot serve this kind of record.
    #[error("Unsupported entity kind: {0}")]
    Unsupported(EntityKind),

    /// The feed ended without an error.
    #[error("Feed closed")]
    Closed,
}
