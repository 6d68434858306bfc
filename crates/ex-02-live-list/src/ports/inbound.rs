//! # Inbound Ports
//!
//! API trait defining what a live list can do.

use crate::domain::{ListError, ListSnapshot, ListStatus};
use async_trait::async_trait;
use shared_types::entities::{FilterSet, ListResponse, NetworkId, PageKey};

/// Live list API - inbound port.
///
/// Every call that resets the list (`start`, `on_filters_changed`, `stop`)
/// starts a new generation; completions belonging to an older generation are
/// discarded.
#[async_trait]
pub trait LiveListApi<T>: Send + Sync {
    /// Reset the list, open the live feed and request the first page.
    ///
    /// Returns the new generation.
    fn start(&self, network: NetworkId, filters: FilterSet) -> Result<u64, ListError>;

    /// Fetch the page for a key returned by an earlier fetch and merge it.
    ///
    /// The page is also returned to the caller. Failures are not retried.
    async fn fetch_next_page(&self, page_key: PageKey) -> Result<ListResponse<T>, ListError>;

    /// Restart with new filters on the current network.
    fn on_filters_changed(&self, filters: FilterSet) -> Result<u64, ListError>;

    /// Cancel the feed and every pending completion. Idempotent.
    fn stop(&self);

    /// Current state of the list.
    fn snapshot(&self) -> ListSnapshot<T>;

    /// Current lifecycle state.
    fn status(&self) -> ListStatus;
}
