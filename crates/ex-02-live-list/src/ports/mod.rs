//! # Ports Layer
//!
//! Inbound: what the list offers its owner.
//! Outbound: what the list needs from the transport.

pub mod inbound;
pub mod outbound;

pub use inbound::LiveListApi;
pub use outbound::{FetchCall, ListSource, MockListSource};
