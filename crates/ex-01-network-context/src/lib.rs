//! # Network Context (Subsystem 1)
//!
//! Holds the active network identifier and notifies consumers when it
//! changes. It is the gate for all network-scoped work: consumers wait for
//! the first value before issuing any transport call.
//!
//! ## Rules
//!
//! - An empty identifier means "no network selected".
//! - Setting the value it already holds is not a change.
//! - Consumers observe through [`NetworkWatcher`] and never mutate.

pub mod context;
pub mod error;

pub use context::{NetworkContext, NetworkWatcher};
pub use error::NetworkContextError;
