//! # Live List Service
//!
//! `LiveListController` keeps one list for one record kind under one set of
//! filters, fed by a first page, on-demand next pages and a live feed.
//!
//! ## Generations
//!
//! Every reset (`start`, `on_filters_changed`, `stop`, or a failure) bumps the
//! generation. Background tasks and pending fetches carry the generation they
//! were issued under and are ignored once it is no longer current:
//!
//! ```text
//! gen 1: start ──► [feed task] [first page task] ─ fetch_next_page(k1) ─┐
//! gen 2: on_filters_changed ──► abort gen 1 tasks                       │
//!                               [feed task] [first page task]           │
//!                                              k1 completes ◄───────────┘
//!                                              └─► Superseded, list untouched
//! ```
//!
//! ## Locking
//!
//! State lives behind a `parking_lot::Mutex` that is never held across an
//! await point.

use crate::config::LiveListConfig;
use crate::domain::{
    FetchError, ItemList, ListError, ListEvent, ListFailure, ListSnapshot, ListStatus,
    MergeOutcome, MergeSummary, SubscriptionError,
};
use crate::metrics;
use crate::ports::{ListSource, LiveListApi};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::entities::{EntityKind, FilterSet, ListResponse, NetworkId, PageKey};
use shared_types::ordering::{ItemOrdering, NewestFirst};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the list event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

struct ListState<T, O> {
    generation: u64,
    network: Option<NetworkId>,
    filters: FilterSet,
    items: ItemList<T, O>,
    next_page_key: Option<PageKey>,
    issued_keys: HashSet<PageKey>,
    status: ListStatus,
    in_flight: usize,
    tasks: Vec<JoinHandle<()>>,
}

impl<T: Clone, O: ItemOrdering<T>> ListState<T, O> {
    fn snapshot(&self) -> ListSnapshot<T> {
        ListSnapshot {
            items: self.items.to_vec(),
            next_page_key: self.next_page_key.clone(),
            status: self.status.clone(),
            loading: self.in_flight > 0,
            generation: self.generation,
            network: self.network.clone(),
            filters: self.filters.clone(),
        }
    }

    /// End the current generation: abort its tasks and forget pending work.
    fn retire(&mut self) {
        self.generation += 1;
        self.in_flight = 0;
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

/// State shared between the controller and its background tasks.
struct Shared<T, O> {
    kind: EntityKind,
    state: Mutex<ListState<T, O>>,
    snapshots: watch::Sender<ListSnapshot<T>>,
    events: broadcast::Sender<ListEvent>,
}

impl<T, O> Shared<T, O>
where
    T: Clone + Send + Sync + 'static,
    O: ItemOrdering<T> + 'static,
{
    fn publish(&self, state: &ListState<T, O>) {
        self.snapshots.send_replace(state.snapshot());
    }

    fn emit(&self, event: ListEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.state.lock().generation == generation
    }

    /// Merge one live item. Returns `false` once the generation is stale.
    fn merge_item(&self, generation: u64, item: T) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            metrics::record_stale_completion();
            return false;
        }

        let outcome = state.items.merge(item);
        let mut summary = MergeSummary::default();
        match outcome {
            MergeOutcome::Inserted { evicted } => {
                summary.inserted = 1;
                summary.evicted = usize::from(evicted);
            }
            MergeOutcome::Duplicate => summary.duplicates = 1,
            MergeOutcome::Discarded => summary.discarded = 1,
        }
        metrics::record_merge(self.kind.as_str(), &summary);

        if outcome.changed() {
            self.publish(&state);
            self.emit(ListEvent::ItemsChanged {
                generation,
                len: state.items.len(),
            });
        }
        true
    }

    /// Merge a fetched page into the list of `generation`.
    fn merge_page(
        &self,
        generation: u64,
        requested: Option<&PageKey>,
        page: &ListResponse<T>,
    ) -> Result<MergeSummary, ListError> {
        let mut state = self.state.lock();
        if state.generation != generation {
            metrics::record_stale_completion();
            debug!(kind = %self.kind, generation, "Discarding stale page");
            return Err(ListError::Superseded);
        }

        state.in_flight = state.in_flight.saturating_sub(1);
        let summary = state.items.merge_all(page.objects.iter().cloned());
        metrics::record_merge(self.kind.as_str(), &summary);

        // Only the page requested with the current cursor advances it.
        if requested == state.next_page_key.as_ref() {
            state.next_page_key = page.next_page_key.clone();
        }
        if let Some(key) = &page.next_page_key {
            state.issued_keys.insert(key.clone());
        }

        debug!(
            kind = %self.kind,
            generation,
            received = page.objects.len(),
            inserted = summary.inserted,
            has_more = page.has_more(),
            "Page merged"
        );
        self.publish(&state);
        self.emit(ListEvent::PageMerged {
            generation,
            page_key: requested.cloned(),
            received: page.objects.len(),
            inserted: summary.inserted,
            next_page_key: page.next_page_key.clone(),
        });
        Ok(summary)
    }

    /// Make the list of `generation` inactive. Returns `false` if stale.
    fn fail(&self, generation: u64, failure: ListFailure) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            metrics::record_stale_completion();
            return false;
        }

        warn!(kind = %self.kind, generation, error = %failure, "List inactive");
        state.retire();
        state.status = ListStatus::Inactive(failure.clone());
        let event = match failure {
            ListFailure::Fetch(error) => {
                metrics::record_failure(self.kind.as_str(), "fetch");
                ListEvent::FetchFailed { generation, error }
            }
            ListFailure::Subscription(error) => {
                metrics::record_failure(self.kind.as_str(), "subscription");
                ListEvent::SubscriptionFailed { generation, error }
            }
        };
        self.publish(&state);
        self.emit(event);
        true
    }
}

/// One outstanding `fetch_next_page` call.
///
/// Settled by `merge_page` or `fail` once the transport answers. If the
/// caller drops the fetch first, the count is released here instead.
struct PendingFetch<T, O>
where
    T: Clone + Send + Sync + 'static,
    O: ItemOrdering<T> + 'static,
{
    shared: Arc<Shared<T, O>>,
    generation: u64,
    armed: bool,
}

impl<T, O> PendingFetch<T, O>
where
    T: Clone + Send + Sync + 'static,
    O: ItemOrdering<T> + 'static,
{
    /// Count a fetch against the current generation. Must be the last use of
    /// `state` before its lock is released.
    fn begin(shared: &Arc<Shared<T, O>>, state: &mut ListState<T, O>) -> Self {
        state.in_flight += 1;
        shared.publish(state);
        Self {
            shared: shared.clone(),
            generation: state.generation,
            armed: true,
        }
    }

    fn settled(mut self) {
        self.armed = false;
    }
}

impl<T, O> Drop for PendingFetch<T, O>
where
    T: Clone + Send + Sync + 'static,
    O: ItemOrdering<T> + 'static,
{
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.shared.state.lock();
        if state.generation != self.generation || state.in_flight == 0 {
            return;
        }
        state.in_flight -= 1;
        debug!(kind = %self.shared.kind, generation = self.generation, "Abandoned page fetch released");
        self.shared.publish(&state);
    }
}

/// Paginated live list controller.
///
/// Owns its list and its live feed exclusively. Dropping the controller
/// stops it.
pub struct LiveListController<T, S, O = NewestFirst>
where
    T: Clone + Send + Sync + 'static,
    S: ListSource<T> + ?Sized + 'static,
    O: ItemOrdering<T> + 'static,
{
    config: LiveListConfig,
    source: Arc<S>,
    shared: Arc<Shared<T, O>>,
}

impl<T, S> LiveListController<T, S, NewestFirst>
where
    T: Clone + Send + Sync + 'static,
    S: ListSource<T> + ?Sized + 'static,
    NewestFirst: ItemOrdering<T>,
{
    /// A controller using the reference ordering (newest first).
    pub fn new(kind: EntityKind, config: LiveListConfig, source: Arc<S>) -> Result<Self, ListError> {
        Self::with_ordering(kind, config, source, NewestFirst)
    }
}

impl<T, S, O> LiveListController<T, S, O>
where
    T: Clone + Send + Sync + 'static,
    S: ListSource<T> + ?Sized + 'static,
    O: ItemOrdering<T> + 'static,
{
    /// A controller with a custom ordering.
    pub fn with_ordering(
        kind: EntityKind,
        config: LiveListConfig,
        source: Arc<S>,
        ordering: O,
    ) -> Result<Self, ListError> {
        config.validate()?;

        let (snapshots, _) = watch::channel(ListSnapshot::default());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let state = ListState {
            generation: 0,
            network: None,
            filters: FilterSet::new(),
            items: ItemList::new(config.list_size, ordering),
            next_page_key: None,
            issued_keys: HashSet::new(),
            status: ListStatus::Idle,
            in_flight: 0,
            tasks: Vec::new(),
        };

        Ok(Self {
            config,
            source,
            shared: Arc::new(Shared {
                kind,
                state: Mutex::new(state),
                snapshots,
                events,
            }),
        })
    }

    /// Entity kind this list shows.
    pub fn kind(&self) -> EntityKind {
        self.shared.kind
    }

    /// Configuration in use.
    pub fn config(&self) -> &LiveListConfig {
        &self.config
    }

    /// Observe snapshots; the receiver sees every published state.
    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<T>> {
        self.shared.snapshots.subscribe()
    }

    /// Receive list events from now on.
    pub fn events(&self) -> broadcast::Receiver<ListEvent> {
        self.shared.events.subscribe()
    }

    /// Filters in effect.
    pub fn filters(&self) -> FilterSet {
        self.shared.state.lock().filters.clone()
    }

    /// Network the list is scoped to.
    pub fn network(&self) -> Option<NetworkId> {
        self.shared.state.lock().network.clone()
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.shared.state.lock().generation
    }

    /// Whether a page fetch is outstanding.
    pub fn is_loading(&self) -> bool {
        self.shared.state.lock().in_flight > 0
    }

    /// Key of the next page, if any.
    pub fn next_page_key(&self) -> Option<PageKey> {
        self.shared.state.lock().next_page_key.clone()
    }

    /// Listed items, highest ranked first.
    pub fn items(&self) -> Vec<T> {
        self.shared.state.lock().items.to_vec()
    }

    /// Fetch the page after the last one merged.
    pub async fn load_more(&self) -> Result<ListResponse<T>, ListError> {
        let key = {
            let state = self.shared.state.lock();
            Self::ensure_active(&state.status)?;
            state.next_page_key.clone().ok_or(ListError::NoNextPage)?
        };
        self.fetch_next_page(key).await
    }

    fn ensure_active(status: &ListStatus) -> Result<(), ListError> {
        match status {
            ListStatus::Active => Ok(()),
            ListStatus::Inactive(failure) => Err(ListError::Inactive(failure.clone())),
            ListStatus::Idle | ListStatus::Stopped => Err(ListError::NotStarted),
        }
    }

    /// Begin a new generation on `network` with `filters`.
    ///
    /// # Panics
    ///
    /// Spawns the feed and first-page tasks, so it must run inside a Tokio
    /// runtime.
    fn restart(&self, state: &mut ListState<T, O>, network: NetworkId, filters: FilterSet) -> u64 {
        state.retire();
        let generation = state.generation;

        state.items.clear();
        state.next_page_key = None;
        state.issued_keys.clear();
        state.network = Some(network.clone());
        state.filters = filters.clone();
        state.status = ListStatus::Active;
        state.in_flight = 1;

        let feed = tokio::spawn(run_feed(
            self.shared.clone(),
            self.source.clone(),
            network.clone(),
            filters.clone(),
            generation,
        ));
        let first_page = tokio::spawn(run_first_page(
            self.shared.clone(),
            self.source.clone(),
            network.clone(),
            filters,
            self.config.page_size,
            generation,
        ));
        state.tasks.push(feed);
        state.tasks.push(first_page);

        metrics::record_generation();
        info!(kind = %self.shared.kind, network = %network, generation, "List started");
        self.shared.publish(state);
        self.shared.emit(ListEvent::Started {
            generation,
            network,
        });
        generation
    }
}

#[async_trait]
impl<T, S, O> LiveListApi<T> for LiveListController<T, S, O>
where
    T: Clone + Send + Sync + 'static,
    S: ListSource<T> + ?Sized + 'static,
    O: ItemOrdering<T> + 'static,
{
    fn start(&self, network: NetworkId, filters: FilterSet) -> Result<u64, ListError> {
        if network.is_empty() {
            return Err(ListError::InvalidNetwork);
        }
        let mut state = self.shared.state.lock();
        Ok(self.restart(&mut state, network, filters))
    }

    async fn fetch_next_page(&self, page_key: PageKey) -> Result<ListResponse<T>, ListError> {
        let (network, filters, pending) = {
            let mut state = self.shared.state.lock();
            Self::ensure_active(&state.status)?;
            if !state.issued_keys.contains(&page_key) {
                return Err(ListError::UnknownPageKey(page_key));
            }
            let network = state.network.clone().ok_or(ListError::NotStarted)?;
            let filters = state.filters.clone();
            (network, filters, PendingFetch::begin(&self.shared, &mut state))
        };
        let generation = pending.generation;

        debug!(kind = %self.shared.kind, generation, page_key = %page_key, "Fetching next page");
        let result = self
            .source
            .fetch(
                &network,
                self.shared.kind,
                &filters,
                self.config.page_size,
                Some(&page_key),
            )
            .await;

        match result {
            Ok(page) => {
                let merged = self.shared.merge_page(generation, Some(&page_key), &page);
                pending.settled();
                merged.map(|_| page)
            }
            Err(cause) => {
                let error = FetchError {
                    page_key: Some(page_key),
                    cause,
                };
                let failed = self.shared.fail(generation, error.clone().into());
                pending.settled();
                if failed {
                    Err(ListError::Fetch(error))
                } else {
                    Err(ListError::Superseded)
                }
            }
        }
    }

    fn on_filters_changed(&self, filters: FilterSet) -> Result<u64, ListError> {
        let mut state = self.shared.state.lock();
        if matches!(state.status, ListStatus::Idle | ListStatus::Stopped) {
            return Err(ListError::NotStarted);
        }
        let network = state.network.clone().ok_or(ListError::NotStarted)?;
        debug!(kind = %self.shared.kind, filters = ?filters, "Filters changed");
        Ok(self.restart(&mut state, network, filters))
    }

    fn stop(&self) {
        let mut state = self.shared.state.lock();
        if state.status == ListStatus::Stopped {
            return;
        }
        state.retire();
        state.status = ListStatus::Stopped;
        let generation = state.generation;

        info!(kind = %self.shared.kind, generation, "List stopped");
        self.shared.publish(&state);
        self.shared.emit(ListEvent::Stopped { generation });
    }

    fn snapshot(&self) -> ListSnapshot<T> {
        self.shared.snapshots.borrow().clone()
    }

    fn status(&self) -> ListStatus {
        self.shared.state.lock().status.clone()
    }
}

impl<T, S, O> Drop for LiveListController<T, S, O>
where
    T: Clone + Send + Sync + 'static,
    S: ListSource<T> + ?Sized + 'static,
    O: ItemOrdering<T> + 'static,
{
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// BACKGROUND TASKS
// =============================================================================

async fn run_feed<T, S, O>(
    shared: Arc<Shared<T, O>>,
    source: Arc<S>,
    network: NetworkId,
    filters: FilterSet,
    generation: u64,
) where
    T: Clone + Send + Sync + 'static,
    S: ListSource<T> + ?Sized + 'static,
    O: ItemOrdering<T> + 'static,
{
    let mut feed = match source.subscribe(&network, shared.kind, &filters).await {
        Ok(feed) => feed,
        Err(cause) => {
            shared.fail(generation, SubscriptionError::Rejected(cause).into());
            return;
        }
    };
    if !shared.is_current(generation) {
        feed.unsubscribe();
        return;
    }
    debug!(kind = %shared.kind, network = %network, generation, "Live feed open");

    loop {
        match feed.next().await {
            Some(Ok(item)) => {
                if !shared.merge_item(generation, item) {
                    break;
                }
            }
            Some(Err(cause)) => {
                shared.fail(generation, SubscriptionError::Dropped(cause).into());
                break;
            }
            None => {
                shared.fail(generation, SubscriptionError::Closed.into());
                break;
            }
        }
    }
    feed.unsubscribe();
}

async fn run_first_page<T, S, O>(
    shared: Arc<Shared<T, O>>,
    source: Arc<S>,
    network: NetworkId,
    filters: FilterSet,
    page_size: usize,
    generation: u64,
) where
    T: Clone + Send + Sync + 'static,
    S: ListSource<T> + ?Sized + 'static,
    O: ItemOrdering<T> + 'static,
{
    match source
        .fetch(&network, shared.kind, &filters, page_size, None)
        .await
    {
        Ok(page) => {
            // Stale pages are already counted by merge_page.
            let _ = shared.merge_page(generation, None, &page);
        }
        Err(cause) => {
            let error = FetchError {
                page_key: None,
                cause,
            };
            shared.fail(generation, error.into());
        }
    }
}
