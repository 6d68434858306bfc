//! # Shared Bus - In-Process Chain Feed
//!
//! A broadcast event bus plus [`InMemoryChain`], an offline chain that
//! implements every transport port in `shared-types`.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────────┐
//! │ InMemoryChain│                    │ FeedSubscription │
//! │   (writes)   │    send()          │   (per owner)    │
//! │              │ ──────┐            │                  │
//! └──────────────┘       │            └──────────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  forwarder task
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod chain;
pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use chain::{ChainRecord, InMemoryChain, NetworkLedger};
pub use events::{ChainEvent, EventFilter, EventTopic};
pub use publisher::InMemoryEventBus;
pub use subscriber::{BusError, Subscription};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
