//! Observable network identifier.

use crate::error::NetworkContextError;
use shared_types::entities::NetworkId;
use tokio::sync::watch;
use tracing::info;

/// Owner of the active network identifier.
///
/// Dropping the context closes every [`NetworkWatcher`].
#[derive(Debug)]
pub struct NetworkContext {
    sender: watch::Sender<Option<NetworkId>>,
}

impl NetworkContext {
    /// A context with no network selected.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// A context with an initial network. An empty id selects nothing.
    #[must_use]
    pub fn with_network(network: impl Into<NetworkId>) -> Self {
        let network = network.into();
        let initial = (!network.is_empty()).then_some(network);
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Select a network.
    ///
    /// An empty id clears the selection. Returns `true` only when the value
    /// actually changed, so watchers see one notification per change.
    pub fn set_network(&self, network: impl Into<NetworkId>) -> bool {
        let network = network.into();
        if network.is_empty() {
            return self.clear();
        }

        let changed = self.sender.send_if_modified(|current| {
            if current.as_ref() == Some(&network) {
                return false;
            }
            *current = Some(network.clone());
            true
        });
        if changed {
            info!(network = %network, "Active network changed");
        }
        changed
    }

    /// Clear the selection. Returns `true` if a network was selected.
    pub fn clear(&self) -> bool {
        let changed = self.sender.send_if_modified(|current| current.take().is_some());
        if changed {
            info!("Active network cleared");
        }
        changed
    }

    /// The selected network, if any.
    #[must_use]
    pub fn current(&self) -> Option<NetworkId> {
        self.sender.borrow().clone()
    }

    /// Observe the selection.
    #[must_use]
    pub fn subscribe(&self) -> NetworkWatcher {
        NetworkWatcher {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live watchers.
    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NetworkContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a [`NetworkContext`].
#[derive(Debug, Clone)]
pub struct NetworkWatcher {
    receiver: watch::Receiver<Option<NetworkId>>,
}

impl NetworkWatcher {
    /// The selected network, if any.
    #[must_use]
    pub fn current(&self) -> Option<NetworkId> {
        self.receiver.borrow().clone()
    }

    /// Wait until a network is selected and return it.
    ///
    /// Resolves immediately if one already is.
    pub async fn ready(&mut self) -> Result<NetworkId, NetworkContextError> {
        let selected = self
            .receiver
            .wait_for(Option::is_some)
            .await
            .map_err(|_| NetworkContextError::Closed)?;
        selected.clone().ok_or(NetworkContextError::Closed)
    }

    /// Wait for the next change and return the new value.
    ///
    /// `None` means the selection was cleared.
    pub async fn changed(&mut self) -> Result<Option<NetworkId>, NetworkContextError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| NetworkContextError::Closed)?;
        Ok(self.receiver.borrow_and_update().clone())
    }
}
