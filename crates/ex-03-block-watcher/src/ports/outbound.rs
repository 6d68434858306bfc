//! # Outbound Ports
//!
//! Everything a watcher reads: the block-state feed, the head feed, and
//! the two paged queries used for enrichment.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::entities::{
    Block, BlockNumber, EntityKind, Event, Extrinsic, FilterSet, ListResponse, NetworkId, PageKey,
};
use shared_types::errors::TransportError;
use shared_types::transport::{BlockStateSource, FeedSubscription, HeadNumberSource, PagedQuery};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Block state, head number and per-block record queries.
pub trait WatcherSource:
    BlockStateSource + HeadNumberSource + PagedQuery<Extrinsic> + PagedQuery<Event>
{
}

impl<S> WatcherSource for S where
    S: BlockStateSource + HeadNumberSource + PagedQuery<Extrinsic> + PagedQuery<Event> + ?Sized
{
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

type PageResult<T> = Result<ListResponse<T>, TransportError>;
type FeedSender<T> = mpsc::UnboundedSender<Result<T, TransportError>>;

enum Reply<T> {
    Ready(PageResult<T>),
    Gated(oneshot::Receiver<PageResult<T>>),
}

impl<T> Reply<T> {
    async fn resolve(reply: Option<Self>) -> PageResult<T> {
        match reply {
            None => Ok(ListResponse::empty()),
            Some(Self::Ready(result)) => result,
            Some(Self::Gated(gate)) => gate.await.unwrap_or(Err(TransportError::Closed)),
        }
    }
}

/// An enrichment request seen by [`MockWatcherSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentCall {
    /// Kind requested.
    pub kind: EntityKind,
    /// Filters requested.
    pub filters: FilterSet,
    /// Page key requested.
    pub page_key: Option<PageKey>,
}

#[derive(Default)]
struct MockState {
    blocks: Vec<(BlockNumber, FeedSender<Block>)>,
    heads: Vec<FeedSender<BlockNumber>>,
    extrinsic_replies: VecDeque<Reply<Extrinsic>>,
    event_replies: VecDeque<Reply<Event>>,
    calls: Vec<EnrichmentCall>,
    watch_calls: usize,
    reject_watch: Option<TransportError>,
}

/// Scripted watcher source.
///
/// Block and head emissions are pushed by the test. Enrichment replies are
/// served per kind in the order pushed; an exhausted script answers with an
/// empty last page.
#[derive(Default)]
pub struct MockWatcherSource {
    state: Mutex<MockState>,
    active_feeds: Arc<AtomicUsize>,
}

impl MockWatcherSource {
    /// An empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a block state to every feed watching its number.
    pub fn emit_block(&self, block: Block) -> usize {
        let mut state = self.state.lock();
        state.blocks.retain(|(_, feed)| !feed.is_closed());
        state
            .blocks
            .iter()
            .filter(|(number, _)| *number == block.number)
            .filter(|(_, feed)| feed.send(Ok(block.clone())).is_ok())
            .count()
    }

    /// Push a head number to every head feed.
    pub fn emit_head(&self, number: BlockNumber) -> usize {
        let mut state = self.state.lock();
        state.heads.retain(|feed| feed.send(Ok(number)).is_ok());
        state.heads.len()
    }

    /// Break every block-state feed with `error`.
    pub fn fail_block_feeds(&self, error: TransportError) {
        let mut state = self.state.lock();
        for (_, feed) in state.blocks.drain(..) {
            let _ = feed.send(Err(error.clone()));
        }
    }

    /// End every head feed without an error.
    pub fn close_head_feeds(&self) {
        self.state.lock().heads.clear();
    }

    /// Make `watch_block` and `watch_head` fail until cleared with `None`.
    pub fn reject_watch(&self, error: Option<TransportError>) {
        self.state.lock().reject_watch = error;
    }

    /// Script an extrinsics page.
    pub fn push_extrinsics(&self, objects: Vec<Extrinsic>, next_page_key: Option<&str>) {
        let page = ListResponse {
            objects,
            next_page_key: next_page_key.map(PageKey::new),
        };
        self.state.lock().extrinsic_replies.push_back(Reply::Ready(Ok(page)));
    }

    /// Script an events page.
    pub fn push_events(&self, objects: Vec<Event>, next_page_key: Option<&str>) {
        let page = ListResponse {
            objects,
            next_page_key: next_page_key.map(PageKey::new),
        };
        self.state.lock().event_replies.push_back(Reply::Ready(Ok(page)));
    }

    /// Script a failed extrinsics fetch.
    pub fn fail_extrinsics(&self, error: TransportError) {
        self.state.lock().extrinsic_replies.push_back(Reply::Ready(Err(error)));
    }

    /// Script a failed events fetch.
    pub fn fail_events(&self, error: TransportError) {
        self.state.lock().event_replies.push_back(Reply::Ready(Err(error)));
    }

    /// Script an extrinsics reply that resolves when the sender fires.
    pub fn push_extrinsics_gated(&self) -> oneshot::Sender<PageResult<Extrinsic>> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().extrinsic_replies.push_back(Reply::Gated(rx));
        tx
    }

    /// Script an events reply that resolves when the sender fires.
    pub fn push_events_gated(&self) -> oneshot::Sender<PageResult<Event>> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().event_replies.push_back(Reply::Gated(rx));
        tx
    }

    /// Feeds handed out and not yet released.
    pub fn active_feeds(&self) -> usize {
        self.active_feeds.load(Ordering::SeqCst)
    }

    /// Number of `watch_block` and `watch_head` calls.
    pub fn watch_calls(&self) -> usize {
        self.state.lock().watch_calls
    }

    /// Every enrichment fetch received, in order.
    pub fn enrichment_log(&self) -> Vec<EnrichmentCall> {
        self.state.lock().calls.clone()
    }

    /// Enrichment fetches of one kind.
    pub fn enrichment_calls(&self, kind: EntityKind) -> usize {
        self.state.lock().calls.iter().filter(|c| c.kind == kind).count()
    }

    fn open<T: Send + 'static>(
        &self,
        register: impl FnOnce(&mut MockState, FeedSender<T>),
    ) -> Result<FeedSubscription<T>, TransportError> {
        let mut state = self.state.lock();
        state.watch_calls += 1;
        if let Some(error) = state.reject_watch.clone() {
            return Err(error);
        }
        let active = self.active_feeds.clone();
        let (tx, feed) = FeedSubscription::channel(move || {
            active.fetch_sub(1, Ordering::SeqCst);
        });
        self.active_feeds.fetch_add(1, Ordering::SeqCst);
        register(&mut state, tx);
        Ok(feed)
    }

    fn record(&self, kind: EntityKind, filters: &FilterSet, page_key: Option<&PageKey>) {
        self.state.lock().calls.push(EnrichmentCall {
            kind,
            filters: filters.clone(),
            page_key: page_key.cloned(),
        });
    }
}

#[async_trait]
impl BlockStateSource for MockWatcherSource {
    async fn watch_block(
        &self,
        _network: &NetworkId,
        number: BlockNumber,
    ) -> Result<FeedSubscription<Block>, TransportError> {
        self.open(|state, tx| state.blocks.push((number, tx)))
    }
}

#[async_trait]
impl HeadNumberSource for MockWatcherSource {
    async fn watch_head(
        &self,
        _network: &NetworkId,
    ) -> Result<FeedSubscription<BlockNumber>, TransportError> {
        self.open(|state, tx| state.heads.push(tx))
    }
}

#[async_trait]
impl PagedQuery<Extrinsic> for MockWatcherSource {
    async fn fetch(
        &self,
        _network: &NetworkId,
        kind: EntityKind,
        filters: &FilterSet,
        _page_size: usize,
        page_key: Option<&PageKey>,
    ) -> Result<ListResponse<Extrinsic>, TransportError> {
        self.record(kind, filters, page_key);
        let reply = self.state.lock().extrinsic_replies.pop_front();
        Reply::resolve(reply).await
    }
}

#[async_trait]
impl PagedQuery<Event> for MockWatcherSource {
    async fn fetch(
        &self,
        _network: &NetworkId,
        kind: EntityKind,
        filters: &FilterSet,
        _page_size: usize,
        page_key: Option<&PageKey>,
    ) -> Result<ListResponse<Event>, TransportError> {
        self.record(kind, filters, page_key);
        let reply = self.state.lock().event_replies.pop_front();
        Reply::resolve(reply).await
    }
}
