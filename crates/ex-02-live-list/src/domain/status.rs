//! # List Status and Snapshots

use super::errors::ListFailure;
use serde::Serialize;
use shared_types::entities::{FilterSet, NetworkId, PageKey};
use shared_types::ordering::{ItemKey, Sequenced};

/// Lifecycle of a list.
///
/// ```text
///            start                     fetch / feed failure
///   Idle ───────────► Active ─────────────────────────────► Inactive
///                      ▲  │                                    │
///                      │  └──── stop ───► Stopped ◄── stop ────┘
///                      │                     │
///                      └────── start ────────┘ (also from Inactive)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListStatus {
    /// Never started.
    #[default]
    Idle,
    /// Feed open, pages accepted.
    Active,
    /// A fetch or the feed failed; waiting for `start`.
    Inactive(ListFailure),
    /// Stopped by the owner.
    Stopped,
}

impl ListStatus {
    /// Whether the list accepts items and page requests.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// The failure that made the list inactive, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&ListFailure> {
        match self {
            Self::Inactive(failure) => Some(failure),
            _ => None,
        }
    }

    /// Stable lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Inactive(_) => "inactive",
            Self::Stopped => "stopped",
        }
    }
}

impl Serialize for ListStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Point-in-time view of a list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSnapshot<T> {
    /// Listed items, highest ranked first.
    pub items: Vec<T>,
    /// Key of the next page, if more history is available.
    pub next_page_key: Option<PageKey>,
    /// Lifecycle state.
    pub status: ListStatus,
    /// Whether a page fetch is outstanding.
    pub loading: bool,
    /// Generation the snapshot belongs to.
    pub generation: u64,
    /// Network the list is scoped to.
    pub network: Option<NetworkId>,
    /// Filters in effect.
    pub filters: FilterSet,
}

impl<T> Default for ListSnapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_page_key: None,
            status: ListStatus::Idle,
            loading: false,
            generation: 0,
            network: None,
            filters: FilterSet::new(),
        }
    }
}

impl<T> ListSnapshot<T> {
    /// Whether another page can be loaded.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.next_page_key.is_some()
    }
}

impl<T: Sequenced> ListSnapshot<T> {
    /// Row tracking keys, in list order.
    #[must_use]
    pub fn keys(&self) -> Vec<ItemKey> {
        self.items.iter().map(Sequenced::item_key).collect()
    }
}
