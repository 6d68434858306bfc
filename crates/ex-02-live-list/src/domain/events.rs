//! # List Events
//!
//! Notifications broadcast by a list as it evolves.

use super::errors::{FetchError, SubscriptionError};
use shared_types::entities::{NetworkId, PageKey};

/// Events emitted by a live list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    /// A new generation started (start, filter change, restart).
    Started {
        /// New generation.
        generation: u64,
        /// Network the generation is scoped to.
        network: NetworkId,
    },
    /// A live item changed the list.
    ItemsChanged {
        /// Current generation.
        generation: u64,
        /// List length after the change.
        len: usize,
    },
    /// A page was merged.
    PageMerged {
        /// Current generation.
        generation: u64,
        /// Key the page was requested with; `None` for the first page.
        page_key: Option<PageKey>,
        /// Records in the page.
        received: usize,
        /// Records that entered the list.
        inserted: usize,
        /// Continuation returned with the page.
        next_page_key: Option<PageKey>,
    },
    /// A page fetch failed; the list is inactive.
    FetchFailed {
        /// Generation that failed.
        generation: u64,
        /// The failure.
        error: FetchError,
    },
    /// The live feed failed; the list is inactive.
    SubscriptionFailed {
        /// Generation that failed.
        generation: u64,
        /// The failure.
        error: SubscriptionError,
    },
    /// The owner stopped the list.
    Stopped {
        /// Generation that was stopped.
        generation: u64,
    },
}

impl ListEvent {
    /// Generation the event belongs to.
    #[must_use]
    pub fn generation(&self) -> u64 {
        match self {
            Self::Started { generation, .. }
            | Self::ItemsChanged { generation, .. }
            | Self::PageMerged { generation, .. }
            | Self::FetchFailed { generation, .. }
            | Self::SubscriptionFailed { generation, .. }
            | Self::Stopped { generation } => *generation,
        }
    }
}
