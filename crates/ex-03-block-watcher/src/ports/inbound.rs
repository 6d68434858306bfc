//! # Inbound Ports
//!
//! What a watcher offers its owner.

use crate::domain::{WatchSnapshot, WatcherError};
use async_trait::async_trait;
use shared_types::entities::{Block, NetworkId};

/// Block watcher API.
#[async_trait]
pub trait BlockWatcherApi: Send + Sync {
    /// Open both feeds on `network` and start observing.
    fn start(&self, network: NetworkId) -> Result<(), WatcherError>;

    /// Release everything. Idempotent.
    fn stop(&self);

    /// Current state.
    fn snapshot(&self) -> WatchSnapshot;

    /// Resolve with the finalized block, or with why it never will be.
    async fn wait_finalized(&self) -> Result<Block, WatcherError>;
}
