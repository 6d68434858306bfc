//! # Ports Layer
//!
//! Inbound: what the watcher offers its owner.
//! Outbound: what the watcher needs from the transport.

pub mod inbound;
pub mod outbound;

pub use inbound::BlockWatcherApi;
pub use outbound::{EnrichmentCall, MockWatcherSource, WatcherSource};
