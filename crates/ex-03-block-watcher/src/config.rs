//! # Block Watcher Configuration

use crate::domain::WatcherError;
use serde::{Deserialize, Serialize};

/// Block watcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Records requested per enrichment page
    pub enrichment_page_size: usize,
    /// Upper bound on pages followed per record kind
    pub max_enrichment_pages: usize,
    /// Fetch the block's extrinsics once finalized
    pub fetch_extrinsics: bool,
    /// Fetch the block's events once finalized
    pub fetch_events: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enrichment_page_size: 100,
            max_enrichment_pages: 10,
            fetch_extrinsics: true,
            fetch_events: true,
        }
    }
}

impl WatcherConfig {
    /// Small pages so tests exercise page following
    pub fn for_testing() -> Self {
        Self {
            enrichment_page_size: 2,
            max_enrichment_pages: 3,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), WatcherError> {
        if self.enrichment_page_size == 0 {
            return Err(WatcherError::InvalidConfig(
                "enrichment_page_size must be greater than 0".into(),
            ));
        }
        if self.max_enrichment_pages == 0 {
            return Err(WatcherError::InvalidConfig(
                "max_enrichment_pages must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Whether any enrichment fetch is enabled
    pub fn enriches(&self) -> bool {
        self.fetch_extrinsics || self.fetch_events
    }
}
