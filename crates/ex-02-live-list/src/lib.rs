//! # Live List (Subsystem 2)
//!
//! Paginated list of chain records kept current by a live feed.
//!
//! ## Purpose
//!
//! Reconcile two sources per list into one consistent, bounded sequence:
//! - a historical page fetched on demand (first page, then next pages)
//! - an unbounded live feed of newly produced records
//!
//! Both paths go through the same merge rule (see [`ItemList`]), so the
//! result does not depend on how page completions and live pushes
//! interleave.
//!
//! ## Module Structure
//!
//! ```text
//! ex-02-live-list/
//! ├── domain/          # ItemList, ListStatus, ListSnapshot, ListEvent, errors
//! ├── ports/           # LiveListApi (inbound) + ListSource (outbound), MockListSource
//! ├── application/     # LiveListController
//! ├── presets.rs       # Inherent / extrinsic / event filter builders
//! ├── network.rs       # follow_network: restart on network change
//! ├── metrics.rs       # Prometheus counters (feature "metrics")
//! └── config.rs        # LiveListConfig
//! ```

#![warn(clippy::all)]

pub mod application;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod network;
pub mod ports;
pub mod presets;

// Re-exports
pub use application::LiveListController;
pub use config::LiveListConfig;
pub use domain::{
    FetchError, ItemList, ListError, ListEvent, ListFailure, ListSnapshot, ListStatus,
    MergeOutcome, MergeSummary, SubscriptionError,
};
pub use network::{follow_network, NetworkBinding};
pub use ports::{FetchCall, ListSource, LiveListApi, MockListSource};
pub use presets::{CallFilter, EventFilter};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
