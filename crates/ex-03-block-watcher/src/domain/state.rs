//! # Watch State
//!
//! Phase and snapshot types published by the watcher.

use super::errors::{EnrichmentError, WatcherError};
use shared_types::entities::{Block, BlockNumber, Event, Extrinsic, NetworkId};
use serde::{Serialize, Serializer};

/// Lifecycle of a watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WatchPhase {
    /// Not started, or waiting for the first network.
    #[default]
    Idle,
    /// Both feeds are open, block not yet finalized.
    Observing,
    /// The block was seen finalized. Feeds are released.
    Finalized,
    /// Stopped by the caller or by a source failure.
    Stopped,
}

impl WatchPhase {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Observing => "observing",
            Self::Finalized => "finalized",
            Self::Stopped => "stopped",
        }
    }
}

/// Progress of the post-finalization fetches.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EnrichmentStatus {
    /// Block not finalized yet.
    #[default]
    Pending,
    /// Fetches issued.
    Running,
    /// Every enabled fetch succeeded.
    Completed,
    /// At least one fetch failed. Records of the other kind may still be present.
    Failed(EnrichmentError),
    /// Both fetches are disabled in the configuration.
    Skipped,
    /// The watcher was stopped while fetches were running.
    Cancelled,
}

impl EnrichmentStatus {
    /// Stable lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed(_) => "failed",
            Self::Skipped => "skipped",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further change will happen.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }
}

impl Serialize for EnrichmentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Read-only view of a watcher.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchSnapshot {
    /// Tracked block number.
    pub block_number: BlockNumber,
    /// Network being observed, once known.
    pub network: Option<NetworkId>,
    /// Current phase.
    pub phase: WatchPhase,
    /// Latest block state.
    pub block: Option<Block>,
    /// Latest non-zero head number.
    pub head_number: Option<BlockNumber>,
    /// Head number minus block number, saturating at zero.
    pub blocks_behind: Option<u64>,
    /// Extrinsics of the block, in execution order. Empty until enriched.
    pub extrinsics: Vec<Extrinsic>,
    /// Events of the block, in execution order. Empty until enriched.
    pub events: Vec<Event>,
    /// Enrichment progress.
    pub enrichment: EnrichmentStatus,
    /// Why observation ended early.
    #[serde(skip)]
    pub failure: Option<WatcherError>,
}

impl WatchSnapshot {
    /// Whether the block was seen finalized.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.block.as_ref().is_some_and(|b| b.finalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snapshot = WatchSnapshot {
            block_number: 9,
            phase: WatchPhase::Observing,
            head_number: Some(12),
            blocks_behind: Some(3),
            ..Default::default()
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["phase"], "observing");
        assert_eq!(json["blocksBehind"], 3);
        assert_eq!(json["enrichment"], "pending");
        assert!(json.get("failure").is_none());
    }

    #[test]
    fn test_enrichment_settled() {
        assert!(!EnrichmentStatus::Running.is_settled());
        assert!(EnrichmentStatus::Skipped.is_settled());
        assert!(EnrichmentStatus::Cancelled.is_settled());
    }
}
