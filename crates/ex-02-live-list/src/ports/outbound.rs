//! # Outbound Ports
//!
//! The transport a list reads from: one paged query plus one live feed for
//! the same record type.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::entities::{EntityKind, FilterSet, ListResponse, NetworkId, PageKey};
use shared_types::errors::TransportError;
use shared_types::transport::{FeedSubscription, LiveFeed, PagedQuery};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Paged query plus live feed for one record type.
pub trait ListSource<T>: PagedQuery<T> + LiveFeed<T> {}

impl<T, S> ListSource<T> for S where S: PagedQuery<T> + LiveFeed<T> + ?Sized {}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

type PageResult<T> = Result<ListResponse<T>, TransportError>;

enum MockReply<T> {
    Ready(PageResult<T>),
    Gated(oneshot::Receiver<PageResult<T>>),
}

/// A page request seen by [`MockListSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    /// Network requested.
    pub network: NetworkId,
    /// Entity kind requested.
    pub kind: EntityKind,
    /// Filters requested.
    pub filters: FilterSet,
    /// Page size requested.
    pub page_size: usize,
    /// Page key requested.
    pub page_key: Option<PageKey>,
}

struct MockState<T> {
    replies: VecDeque<MockReply<T>>,
    feeds: Vec<mpsc::UnboundedSender<Result<T, TransportError>>>,
    fetches: Vec<FetchCall>,
    subscribe_calls: usize,
    reject_subscriptions: Option<TransportError>,
}

/// Scripted transport for testing.
///
/// Page replies are served in the order they were pushed; once the script
/// runs out every fetch gets an empty last page. Live items are pushed by
/// the test with [`MockListSource::emit`].
pub struct MockListSource<T> {
    state: Mutex<MockState<T>>,
    active_feeds: Arc<AtomicUsize>,
}

impl<T> Default for MockListSource<T> {
    fn default() -> Self {
        Self {
            state: Mutex::new(MockState {
                replies: VecDeque::new(),
                feeds: Vec::new(),
                fetches: Vec::new(),
                subscribe_calls: 0,
                reject_subscriptions: None,
            }),
            active_feeds: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl<T: Clone + Send + 'static> MockListSource<T> {
    /// An empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a page reply.
    pub fn push_page(&self, objects: Vec<T>, next_page_key: Option<&str>) {
        let page = ListResponse {
            objects,
            next_page_key: next_page_key.map(PageKey::new),
        };
        self.state.lock().replies.push_back(MockReply::Ready(Ok(page)));
    }

    /// Script a failed fetch.
    pub fn push_failure(&self, error: TransportError) {
        self.state.lock().replies.push_back(MockReply::Ready(Err(error)));
    }

    /// Script a reply that resolves when the returned sender fires.
    ///
    /// Dropping the sender fails the fetch with [`TransportError::Closed`].
    pub fn push_gated(&self) -> oneshot::Sender<PageResult<T>> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().replies.push_back(MockReply::Gated(rx));
        tx
    }

    /// Push an item to every open feed. Returns how many feeds received it.
    pub fn emit(&self, item: T) -> usize {
        let mut state = self.state.lock();
        state.feeds.retain(|feed| feed.send(Ok(item.clone())).is_ok());
        state.feeds.len()
    }

    /// Break every open feed with `error`.
    pub fn drop_feeds(&self, error: TransportError) {
        let mut state = self.state.lock();
        for feed in state.feeds.drain(..) {
            let _ = feed.send(Err(error.clone()));
        }
    }

    /// End every open feed without an error.
    pub fn close_feeds(&self) {
        self.state.lock().feeds.clear();
    }

    /// Make `subscribe` fail until cleared with `None`.
    pub fn reject_subscriptions(&self, error: Option<TransportError>) {
        self.state.lock().reject_subscriptions = error;
    }

    /// Feeds handed out and not yet released.
    pub fn active_feeds(&self) -> usize {
        self.active_feeds.load(Ordering::SeqCst)
    }

    /// Number of page fetches received.
    pub fn fetch_calls(&self) -> usize {
        self.state.lock().fetches.len()
    }

    /// Every page fetch received, in order.
    pub fn fetch_log(&self) -> Vec<FetchCall> {
        self.state.lock().fetches.clone()
    }

    /// Number of subscribe calls received.
    pub fn subscribe_calls(&self) -> usize {
        self.state.lock().subscribe_calls
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> PagedQuery<T> for MockListSource<T> {
    async fn fetch(
        &self,
        network: &NetworkId,
        kind: EntityKind,
        filters: &FilterSet,
        page_size: usize,
        page_key: Option<&PageKey>,
    ) -> Result<ListResponse<T>, TransportError> {
        let reply = {
            let mut state = self.state.lock();
            state.fetches.push(FetchCall {
                network: network.clone(),
                kind,
                filters: filters.clone(),
                page_size,
                page_key: page_key.cloned(),
            });
            state.replies.pop_front()
        };

        match reply {
            None => Ok(ListResponse::empty()),
            Some(MockReply::Ready(result)) => result,
            Some(MockReply::Gated(gate)) => gate.await.unwrap_or(Err(TransportError::Closed)),
        }
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> LiveFeed<T> for MockListSource<T> {
    async fn subscribe(
        &self,
        _network: &NetworkId,
        _kind: EntityKind,
        _filters: &FilterSet,
    ) -> Result<FeedSubscription<T>, TransportError> {
        let mut state = self.state.lock();
        state.subscribe_calls += 1;
        if let Some(error) = state.reject_subscriptions.clone() {
            return Err(error);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        state.feeds.push(tx);
        let active = self.active_feeds.clone();
        active.fetch_add(1, Ordering::SeqCst);

        Ok(FeedSubscription::new(rx, move || {
            active.fetch_sub(1, Ordering::SeqCst);
        }))
    }
}
