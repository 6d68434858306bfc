//! Notifications broadcast by a watcher.

use super::errors::{EnrichmentError, WatcherError};
use shared_types::entities::{Block, BlockNumber};

/// Watcher notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherEvent {
    /// A new state of the tracked block arrived.
    BlockUpdated { block: Block },
    /// The chain head moved.
    HeadAdvanced {
        head_number: BlockNumber,
        blocks_behind: u64,
    },
    /// The block was seen finalized. Emitted once.
    Finalized { block: Block },
    /// Every enabled enrichment fetch succeeded.
    EnrichmentCompleted { extrinsics: usize, events: usize },
    /// One enrichment fetch failed.
    EnrichmentFailed { error: EnrichmentError },
    /// A feed failed before finalization. Observation ended.
    SourceFailed { error: WatcherError },
    /// The watcher was stopped.
    Stopped,
}
