//! # Network Binding
//!
//! Keeps a list in step with the [`NetworkContext`](ex_01_network_context::NetworkContext):
//!
//! - no work until the first network is selected
//! - each network change resets the filters to their defaults and restarts
//! - clearing the network stops the list
//! - the context going away ends the binding (the list keeps its state)

use crate::application::LiveListController;
use crate::ports::{ListSource, LiveListApi};
use ex_01_network_context::NetworkWatcher;
use shared_types::entities::FilterSet;
use shared_types::ordering::ItemOrdering;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Handle to a running network binding. Dropping it ends the binding.
#[derive(Debug)]
pub struct NetworkBinding {
    task: JoinHandle<()>,
}

impl NetworkBinding {
    /// End the binding now.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Whether the binding has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for NetworkBinding {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Drive `controller` from network changes.
///
/// The binding holds a reference to the controller until it ends.
pub fn follow_network<T, S, O>(
    controller: Arc<LiveListController<T, S, O>>,
    mut watcher: NetworkWatcher,
    default_filters: FilterSet,
) -> NetworkBinding
where
    T: Clone + Send + Sync + 'static,
    S: ListSource<T> + ?Sized + 'static,
    O: ItemOrdering<T> + 'static,
{
    let task = tokio::spawn(async move {
        let Ok(first) = watcher.ready().await else {
            debug!("Network context closed before a network was selected");
            return;
        };
        if let Err(e) = controller.start(first, default_filters.clone()) {
            warn!(error = %e, "Failed to start list");
        }

        loop {
            match watcher.changed().await {
                Ok(Some(network)) => {
                    if let Err(e) = controller.start(network, default_filters.clone()) {
                        warn!(error = %e, "Failed to restart list");
                    }
                }
                Ok(None) => controller.stop(),
                Err(_) => {
                    debug!("Network context closed");
                    return;
                }
            }
        }
    });

    NetworkBinding { task }
}
