//! # Domain Errors
//!
//! Error types for the live list.
//!
//! `FetchError` and `SubscriptionError` are the two failure kinds a list can
//! end up inactive with; `ListError` is what operations return.

use shared_types::entities::PageKey;
use shared_types::errors::TransportError;
use thiserror::Error;

/// A paged query failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Page fetch failed (page key: {}): {cause}", .page_key.as_ref().map_or("first", PageKey::as_str))]
pub struct FetchError {
    /// Key of the page that failed; `None` for the first page.
    pub page_key: Option<PageKey>,
    /// Transport failure.
    #[source]
    pub cause: TransportError,
}

/// The live feed failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The transport refused to open the feed.
    #[error("Live subscription rejected: {0}")]
    Rejected(#[source] TransportError),

    /// The feed broke after it was opened.
    #[error("Live subscription dropped: {0}")]
    Dropped(#[source] TransportError),

    /// The feed ended without an error.
    #[error("Live subscription closed by transport")]
    Closed,
}

/// Why a list went inactive.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ListFailure {
    /// A page fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The live feed failed.
    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
}

/// Live list error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ListError {
    /// `start` was called without a network.
    #[error("Network identifier must not be empty")]
    InvalidNetwork,

    /// The configuration is unusable.
    #[error("Invalid list configuration: {0}")]
    InvalidConfig(String),

    /// The list is idle or stopped.
    #[error("List not started")]
    NotStarted,

    /// A fetch or feed failed; `start` must be called again.
    #[error("List inactive: {0}")]
    Inactive(ListFailure),

    /// The last page has been reached.
    #[error("No next page")]
    NoNextPage,

    /// The key was not returned by a fetch of the current list.
    #[error("Unknown page key: {0}")]
    UnknownPageKey(PageKey),

    /// The list was restarted or stopped while the fetch was pending.
    #[error("Fetch superseded by a newer list generation")]
    Superseded,

    /// The page fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The live feed failed.
    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
}
