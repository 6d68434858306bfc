//! Domain layer for the block watcher.

pub mod errors;
pub mod events;
pub mod state;
pub mod tracked_block;

pub use errors::{EnrichmentError, WatcherError};
pub use events::WatcherEvent;
pub use state::{EnrichmentStatus, WatchPhase, WatchSnapshot};
pub use tracked_block::{TrackedBlock, Transition};
