//! # Transport Contracts
//!
//! Outbound ports every subsystem consumes. Implementations talk to the
//! chain (or to an in-process double); the synchronization core only relies
//! on the contracts below.
//!
//! ## Delivery Guarantees
//!
//! - Page fetches resolve once, with a page or an error.
//! - Live feeds deliver items at-least-once, in any order relative to page
//!   fetches. An `Err` item means the feed is broken and no further items
//!   follow.
//! - A [`FeedSubscription`] releases its transport resources exactly once,
//!   either through [`FeedSubscription::unsubscribe`] or when dropped.

use crate::entities::{Block, BlockNumber, EntityKind, FilterSet, ListResponse, NetworkId, PageKey};
use crate::errors::TransportError;
use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;

/// Pull side: one bounded page of historical records.
#[async_trait]
pub trait PagedQuery<T>: Send + Sync {
    /// Fetch one page. `page_key` is `None` for the first page.
    async fn fetch(
        &self,
        network: &NetworkId,
        kind: EntityKind,
        filters: &FilterSet,
        page_size: usize,
        page_key: Option<&PageKey>,
    ) -> Result<ListResponse<T>, TransportError>;
}

/// Push side: unbounded feed of newly produced records.
#[async_trait]
pub trait LiveFeed<T>: Send + Sync {
    /// Open a feed. Items start flowing once this resolves.
    async fn subscribe(
        &self,
        network: &NetworkId,
        kind: EntityKind,
        filters: &FilterSet,
    ) -> Result<FeedSubscription<T>, TransportError>;
}

/// Per-block state observable.
#[async_trait]
pub trait BlockStateSource: Send + Sync {
    /// Watch one block. Emits the current state first when it is known.
    async fn watch_block(
        &self,
        network: &NetworkId,
        number: BlockNumber,
    ) -> Result<FeedSubscription<Block>, TransportError>;
}

/// Chain head observable.
#[async_trait]
pub trait HeadNumberSource: Send + Sync {
    /// Watch the head block number.
    async fn watch_head(
        &self,
        network: &NetworkId,
    ) -> Result<FeedSubscription<BlockNumber>, TransportError>;
}

type ReleaseFn = Box<dyn FnOnce() + Send>;

/// Handle to an open feed.
///
/// Owns the receiving end of the feed and the transport's release callback.
pub struct FeedSubscription<T> {
    receiver: mpsc::UnboundedReceiver<Result<T, TransportError>>,
    release: Option<ReleaseFn>,
}

impl<T> FeedSubscription<T> {
    /// Wrap a receiver together with the callback that tears the feed down.
    pub fn new(
        receiver: mpsc::UnboundedReceiver<Result<T, TransportError>>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            receiver,
            release: Some(Box::new(release)),
        }
    }

    /// A feed with nothing to release beyond the channel itself.
    pub fn detached(receiver: mpsc::UnboundedReceiver<Result<T, TransportError>>) -> Self {
        Self {
            receiver,
            release: None,
        }
    }

    /// Create a sender/subscription pair.
    pub fn channel(
        release: impl FnOnce() + Send + 'static,
    ) -> (mpsc::UnboundedSender<Result<T, TransportError>>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx, release))
    }

    /// Next feed item.
    ///
    /// # Returns
    ///
    /// - `Some(Ok(item))` - an item
    /// - `Some(Err(e))` - the feed broke
    /// - `None` - the feed ended
    pub async fn next(&mut self) -> Option<Result<T, TransportError>> {
        self.receiver.recv().await
    }

    /// Release the feed now instead of on drop.
    pub fn unsubscribe(mut self) {
        self.release_once();
    }

    /// Whether the release callback already ran.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }

    fn release_once(&mut self) {
        self.receiver.close();
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl<T> Drop for FeedSubscription<T> {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl<T> fmt::Debug for FeedSubscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedSubscription")
            .field("released", &self.release.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_feed_delivers_items() {
        let (tx, mut feed) = FeedSubscription::<u32>::channel(|| {});
        tx.send(Ok(1)).unwrap();
        tx.send(Err(TransportError::Closed)).unwrap();

        assert_eq!(feed.next().await, Some(Ok(1)));
        assert_eq!(feed.next().await, Some(Err(TransportError::Closed)));

        drop(tx);
        assert_eq!(feed.next().await, None);
    }

    #[test]
    fn test_release_runs_exactly_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let (_tx, feed) = FeedSubscription::<u32>::channel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // Explicit unsubscribe consumes the handle; drop must not release again.
        feed.unsubscribe();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        {
            let (_tx, feed) = FeedSubscription::<u32>::channel(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            assert!(!feed.is_released());
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sender_fails_after_release() {
        let (tx, feed) = FeedSubscription::<u32>::channel(|| {});
        feed.unsubscribe();
        assert!(tx.send(Ok(1)).is_err());
    }
}
