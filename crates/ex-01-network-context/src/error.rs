//! Error types for the network context.

use thiserror::Error;

/// Errors raised while waiting on the network context.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkContextError {
    /// The context was dropped; no further network values will arrive.
    #[error("Network context closed")]
    Closed,
}
