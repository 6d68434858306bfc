//! # Block Watcher Service
//!
//! `FinalizationWatcher` observes one block number on one network. It is
//! single-use: once started it either reaches finality, fails, or is
//! stopped, and it cannot be started again.
//!
//! ## Task Layout
//!
//! One background task per watcher. It opens both feeds, drives the
//! observation loop, releases the feeds on finality and then runs the
//! enrichment fetches concurrently. `stop` and `Drop` abort it, which
//! drops (and thereby releases) any feed it still holds.
//!
//! ## Locking
//!
//! State lives behind a `parking_lot::Mutex` that is never held across an
//! await point.

use crate::config::WatcherConfig;
use crate::domain::{
    EnrichmentError, EnrichmentStatus, TrackedBlock, Transition, WatchPhase, WatchSnapshot,
    WatcherError, WatcherEvent,
};
use crate::metrics;
use crate::ports::{BlockWatcherApi, WatcherSource};
use async_trait::async_trait;
use ex_01_network_context::NetworkWatcher;
use parking_lot::Mutex;
use shared_types::entities::{Block, BlockNumber, EntityKind, Event, Extrinsic, FilterSet, NetworkId};
use shared_types::errors::TransportError;
use shared_types::ordering::{sort_items, OldestFirst, Sequenced};
use shared_types::transport::PagedQuery;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the watcher event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

type Enriched<T> = Option<Result<Vec<T>, EnrichmentError>>;

struct WatchState {
    tracked: TrackedBlock,
    network: Option<NetworkId>,
    phase: WatchPhase,
    started: bool,
    stopped: bool,
    extrinsics: Vec<Extrinsic>,
    events: Vec<Event>,
    enrichment: EnrichmentStatus,
    failure: Option<WatcherError>,
    task: Option<JoinHandle<()>>,
}

impl WatchState {
    fn snapshot(&self) -> WatchSnapshot {
        WatchSnapshot {
            block_number: self.tracked.number(),
            network: self.network.clone(),
            phase: self.phase,
            block: self.tracked.block().cloned(),
            head_number: self.tracked.head_number(),
            blocks_behind: self.tracked.blocks_behind(),
            extrinsics: self.extrinsics.clone(),
            events: self.events.clone(),
            enrichment: self.enrichment.clone(),
            failure: self.failure.clone(),
        }
    }
}

/// State shared between the watcher and its task.
struct Shared {
    config: WatcherConfig,
    state: Mutex<WatchState>,
    snapshots: watch::Sender<WatchSnapshot>,
    events: broadcast::Sender<WatcherEvent>,
}

impl Shared {
    fn publish(&self, state: &WatchState) {
        self.snapshots.send_replace(state.snapshot());
    }

    fn emit(&self, event: WatcherEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    /// Move from idle to observing. Returns `false` if stopped meanwhile.
    fn begin(&self, network: &NetworkId) -> bool {
        let mut state = self.state.lock();
        if state.stopped || state.phase != WatchPhase::Idle {
            return false;
        }
        state.phase = WatchPhase::Observing;
        state.network = Some(network.clone());
        self.publish(&state);
        info!(
            network = %network,
            block = state.tracked.number(),
            "Watching block for finality"
        );
        true
    }

    /// Apply a block emission. Returns the block once it is finalized.
    fn apply_block(&self, block: Block) -> Option<Block> {
        let mut state = self.state.lock();
        if state.phase != WatchPhase::Observing {
            return None;
        }

        match state.tracked.apply_block(block.clone()) {
            Transition::Ignored => None,
            Transition::Updated => {
                self.publish(&state);
                self.emit(WatcherEvent::BlockUpdated { block });
                None
            }
            Transition::Finalized => {
                state.phase = WatchPhase::Finalized;
                state.enrichment = if self.config.enriches() {
                    EnrichmentStatus::Running
                } else {
                    EnrichmentStatus::Skipped
                };
                self.publish(&state);
                metrics::record_finalized();
                info!(block = block.number, hash = %block.hash, "Block finalized");
                self.emit(WatcherEvent::BlockUpdated {
                    block: block.clone(),
                });
                self.emit(WatcherEvent::Finalized {
                    block: block.clone(),
                });
                Some(block)
            }
        }
    }

    fn apply_head(&self, head_number: BlockNumber) {
        let mut state = self.state.lock();
        if state.phase != WatchPhase::Observing {
            return;
        }
        if state.tracked.apply_head(head_number) == Transition::Updated {
            let blocks_behind = state.tracked.blocks_behind().unwrap_or_default();
            debug!(head = head_number, blocks_behind, "Head advanced");
            self.publish(&state);
            self.emit(WatcherEvent::HeadAdvanced {
                head_number,
                blocks_behind,
            });
        }
    }

    /// End observation with `error`. Only applies before finality.
    fn fail(&self, error: WatcherError) {
        let mut state = self.state.lock();
        if state.stopped || state.phase == WatchPhase::Finalized {
            return;
        }
        state.phase = WatchPhase::Stopped;
        state.stopped = true;
        state.failure = Some(error.clone());
        self.publish(&state);
        metrics::record_failure("observe");
        warn!(block = state.tracked.number(), error = %error, "Block watch failed");
        self.emit(WatcherEvent::SourceFailed { error });
    }

    fn finish_enrichment(&self, extrinsics: Enriched<Extrinsic>, events: Enriched<Event>) {
        let mut state = self.state.lock();
        if state.enrichment != EnrichmentStatus::Running {
            return;
        }

        let mut failures = Vec::new();
        match extrinsics {
            Some(Ok(records)) => state.extrinsics = records,
            Some(Err(error)) => failures.push(error),
            None => {}
        }
        match events {
            Some(Ok(records)) => state.events = records,
            Some(Err(error)) => failures.push(error),
            None => {}
        }

        state.enrichment = match failures.first() {
            Some(error) => EnrichmentStatus::Failed(error.clone()),
            None => EnrichmentStatus::Completed,
        };
        self.publish(&state);

        if failures.is_empty() {
            debug!(
                extrinsics = state.extrinsics.len(),
                events = state.events.len(),
                "Enrichment completed"
            );
            self.emit(WatcherEvent::EnrichmentCompleted {
                extrinsics: state.extrinsics.len(),
                events: state.events.len(),
            });
        }
        for error in failures {
            metrics::record_failure("enrich");
            warn!(error = %error, "Enrichment fetch failed");
            self.emit(WatcherEvent::EnrichmentFailed { error });
        }
    }
}

/// Watches one block until finality, then enriches it once.
pub struct FinalizationWatcher<S>
where
    S: WatcherSource + ?Sized + 'static,
{
    source: Arc<S>,
    shared: Arc<Shared>,
}

impl<S> FinalizationWatcher<S>
where
    S: WatcherSource + ?Sized + 'static,
{
    /// A watcher for `block_number`. Nothing happens until it is started.
    pub fn new(
        block_number: BlockNumber,
        config: WatcherConfig,
        source: Arc<S>,
    ) -> Result<Self, WatcherError> {
        config.validate()?;

        let state = WatchState {
            tracked: TrackedBlock::new(block_number),
            network: None,
            phase: WatchPhase::Idle,
            started: false,
            stopped: false,
            extrinsics: Vec::new(),
            events: Vec::new(),
            enrichment: EnrichmentStatus::Pending,
            failure: None,
            task: None,
        };
        let (snapshots, _) = watch::channel(state.snapshot());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            source,
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(state),
                snapshots,
                events,
            }),
        })
    }

    /// Tracked block number.
    pub fn block_number(&self) -> BlockNumber {
        self.shared.state.lock().tracked.number()
    }

    /// Watcher configuration.
    pub fn config(&self) -> &WatcherConfig {
        &self.shared.config
    }

    /// Current phase.
    pub fn phase(&self) -> WatchPhase {
        self.shared.state.lock().phase
    }

    /// Snapshot stream. The current value is available immediately.
    pub fn subscribe(&self) -> watch::Receiver<WatchSnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Event stream.
    pub fn events(&self) -> broadcast::Receiver<WatcherEvent> {
        self.shared.events.subscribe()
    }

    /// Start on the first network `watcher` reports.
    ///
    /// Later network changes are ignored; a block number only means
    /// something on the network it was requested for. If the context closes
    /// before any network is selected the watcher fails with
    /// [`WatcherError::NetworkClosed`].
    pub fn start_on(&self, mut watcher: NetworkWatcher) -> Result<(), WatcherError> {
        let mut state = self.shared.state.lock();
        Self::ensure_startable(&state)?;
        state.started = true;

        let shared = self.shared.clone();
        let source = self.source.clone();
        state.task = Some(tokio::spawn(async move {
            let network = match watcher.ready().await {
                Ok(network) => network,
                Err(_) => {
                    shared.fail(WatcherError::NetworkClosed);
                    return;
                }
            };
            drop(watcher);
            if shared.begin(&network) {
                run_watch(shared, source, network).await;
            }
        }));
        Ok(())
    }

    /// Wait until observation and enrichment are both over.
    ///
    /// Resolves once the watcher is stopped, or finalized with enrichment
    /// settled. Never resolves for a watcher that is not started.
    pub async fn wait_settled(&self) -> WatchSnapshot {
        let mut rx = self.subscribe();
        let settled = rx
            .wait_for(|s| {
                s.phase == WatchPhase::Stopped
                    || (s.phase == WatchPhase::Finalized && s.enrichment.is_settled())
            })
            .await
            .map(|snapshot| snapshot.clone());
        settled.unwrap_or_else(|_| self.snapshot())
    }

    fn ensure_startable(state: &WatchState) -> Result<(), WatcherError> {
        if state.stopped {
            return Err(WatcherError::Stopped);
        }
        if state.started {
            return Err(WatcherError::AlreadyStarted);
        }
        Ok(())
    }
}

#[async_trait]
impl<S> BlockWatcherApi for FinalizationWatcher<S>
where
    S: WatcherSource + ?Sized + 'static,
{
    fn start(&self, network: NetworkId) -> Result<(), WatcherError> {
        if network.is_empty() {
            return Err(WatcherError::InvalidNetwork);
        }

        let mut state = self.shared.state.lock();
        Self::ensure_startable(&state)?;
        state.started = true;
        state.phase = WatchPhase::Observing;
        state.network = Some(network.clone());
        self.shared.publish(&state);
        info!(network = %network, block = state.tracked.number(), "Watching block for finality");

        state.task = Some(tokio::spawn(run_watch(
            self.shared.clone(),
            self.source.clone(),
            network,
        )));
        Ok(())
    }

    fn stop(&self) {
        let mut state = self.shared.state.lock();
        if state.stopped {
            return;
        }
        state.stopped = true;
        if let Some(task) = state.task.take() {
            task.abort();
        }
        match state.phase {
            WatchPhase::Finalized => {
                if state.enrichment == EnrichmentStatus::Running {
                    state.enrichment = EnrichmentStatus::Cancelled;
                }
            }
            _ => state.phase = WatchPhase::Stopped,
        }
        self.shared.publish(&state);
        debug!(block = state.tracked.number(), "Watcher stopped");
        self.shared.emit(WatcherEvent::Stopped);
    }

    fn snapshot(&self) -> WatchSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    async fn wait_finalized(&self) -> Result<Block, WatcherError> {
        let mut rx = self.subscribe();
        let snapshot = rx
            .wait_for(|s| s.is_finalized() || s.phase == WatchPhase::Stopped)
            .await
            .map(|snapshot| snapshot.clone())
            .map_err(|_| WatcherError::Stopped)?;

        match snapshot.block {
            Some(block) if block.finalized => Ok(block),
            _ => Err(snapshot.failure.unwrap_or(WatcherError::Stopped)),
        }
    }
}

impl<S> Drop for FinalizationWatcher<S>
where
    S: WatcherSource + ?Sized + 'static,
{
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// BACKGROUND TASK
// =============================================================================

async fn run_watch<S>(shared: Arc<Shared>, source: Arc<S>, network: NetworkId)
where
    S: WatcherSource + ?Sized + 'static,
{
    let number = shared.state.lock().tracked.number();
    let (blocks, heads) = tokio::join!(
        source.watch_block(&network, number),
        source.watch_head(&network)
    );
    // A feed that did open is released when dropped on the error paths.
    let (mut blocks, mut heads) = match (blocks, heads) {
        (Ok(blocks), Ok(heads)) => (blocks, heads),
        (Err(cause), _) | (_, Err(cause)) => {
            shared.fail(WatcherError::Source(cause));
            return;
        }
    };

    let finalized = loop {
        tokio::select! {
            biased;

            item = blocks.next() => match item {
                Some(Ok(block)) => {
                    if let Some(block) = shared.apply_block(block) {
                        break block;
                    }
                }
                Some(Err(cause)) => {
                    shared.fail(WatcherError::Source(cause));
                    return;
                }
                None => {
                    shared.fail(WatcherError::Source(TransportError::Closed));
                    return;
                }
            },
            item = heads.next() => match item {
                Some(Ok(head_number)) => shared.apply_head(head_number),
                Some(Err(cause)) => {
                    shared.fail(WatcherError::Source(cause));
                    return;
                }
                None => {
                    shared.fail(WatcherError::Source(TransportError::Closed));
                    return;
                }
            },
        }
    };

    blocks.unsubscribe();
    heads.unsubscribe();

    if shared.config.enriches() {
        enrich(&shared, &*source, &network, finalized.number).await;
    }
}

/// Fetch the records of a finalized block, both kinds concurrently.
async fn enrich<S>(shared: &Shared, source: &S, network: &NetworkId, number: BlockNumber)
where
    S: WatcherSource + ?Sized,
{
    let config = &shared.config;
    let filters = FilterSet::for_block(number);

    let extrinsics = async {
        if config.fetch_extrinsics {
            Some(fetch_all::<Extrinsic, S>(source, network, EntityKind::Extrinsic, &filters, config).await)
        } else {
            None
        }
    };
    let events = async {
        if config.fetch_events {
            Some(fetch_all::<Event, S>(source, network, EntityKind::Event, &filters, config).await)
        } else {
            None
        }
    };

    let (extrinsics, events) = tokio::join!(extrinsics, events);
    shared.finish_enrichment(extrinsics, events);
}

/// Follow page keys until the last page or the page limit.
async fn fetch_all<T, Q>(
    source: &Q,
    network: &NetworkId,
    kind: EntityKind,
    filters: &FilterSet,
    config: &WatcherConfig,
) -> Result<Vec<T>, EnrichmentError>
where
    T: Sequenced,
    Q: PagedQuery<T> + ?Sized,
{
    let mut records = Vec::new();
    let mut page_key = None;
    let mut pages_fetched = 0;

    loop {
        let page = source
            .fetch(network, kind, filters, config.enrichment_page_size, page_key.as_ref())
            .await
            .map_err(|cause| EnrichmentError {
                kind,
                pages_fetched,
                cause,
            })?;
        pages_fetched += 1;
        metrics::record_enrichment_page(kind.as_str());
        records.extend(page.objects);

        match page.next_page_key {
            None => break,
            Some(next) if pages_fetched < config.max_enrichment_pages => page_key = Some(next),
            Some(_) => {
                warn!(
                    kind = %kind,
                    pages = pages_fetched,
                    "Enrichment page limit reached, records truncated"
                );
                break;
            }
        }
    }

    sort_items(&mut records, &OldestFirst);
    Ok(records)
}
