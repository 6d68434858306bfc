//! # Live List Configuration

use crate::domain::ListError;
use serde::{Deserialize, Serialize};

/// Default maximum number of listed items.
pub const DEFAULT_LIST_SIZE: usize = 100;

/// Default number of records requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Live list configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveListConfig {
    /// Maximum number of listed items; the lowest ranked are evicted.
    pub list_size: usize,

    /// Records requested per page fetch.
    pub page_size: usize,
}

impl Default for LiveListConfig {
    fn default() -> Self {
        Self {
            list_size: DEFAULT_LIST_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl LiveListConfig {
    /// Create a config for testing (smaller values).
    pub fn for_testing() -> Self {
        Self {
            list_size: 3,
            page_size: 2,
        }
    }

    /// Reject unusable values.
    pub fn validate(&self) -> Result<(), ListError> {
        if self.list_size == 0 {
            return Err(ListError::InvalidConfig("list_size must be at least 1".into()));
        }
        if self.page_size == 0 {
            return Err(ListError::InvalidConfig("page_size must be at least 1".into()));
        }
        Ok(())
    }
}
