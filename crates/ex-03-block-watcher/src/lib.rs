//! # Block Watcher (Subsystem 3)
//!
//! Observes one block until it is finalized, then fetches its extrinsics
//! and events once.
//!
//! ## Flow
//!
//! ```text
//! network ready ──► watch_block(n) ─┐
//!                   watch_head()  ──┴─► select! ──► block.finalized?
//!                                                     │ no: publish, keep going
//!                                                     ▼ yes
//!                                       release both feeds
//!                                                     │
//!                            join!(extrinsics(n), events(n))  (one shot)
//! ```
//!
//! Finalization is read from the block state only. Head numbers feed the
//! "blocks behind" display and never decide finality.
//!
//! ## Module Structure
//!
//! ```text
//! ex-03-block-watcher/
//! ├── domain/          # TrackedBlock, WatchSnapshot, WatcherEvent, errors
//! ├── ports/           # BlockWatcherApi (inbound) + WatcherSource (outbound), MockWatcherSource
//! ├── application/     # FinalizationWatcher
//! ├── metrics.rs       # Prometheus counters (feature "metrics")
//! └── config.rs        # WatcherConfig
//! ```

#![warn(clippy::all)]

pub mod application;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;

// Re-exports
pub use application::FinalizationWatcher;
pub use config::WatcherConfig;
pub use domain::{
    EnrichmentError, EnrichmentStatus, TrackedBlock, Transition, WatchPhase, WatchSnapshot,
    WatcherError, WatcherEvent,
};
pub use ports::{BlockWatcherApi, EnrichmentCall, MockWatcherSource, WatcherSource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
