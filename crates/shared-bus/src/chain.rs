//! # In-Memory Chain
//!
//! An offline chain that implements every transport port over the event bus.
//!
//! ## Data Flow
//!
//! ```text
//!  push_extrinsic / push_event / put_block / set_head
//!          │
//!          ├──► ledger (per network)  ◄── PagedQuery::fetch (newest first)
//!          │
//!          └──► InMemoryEventBus ──► forwarder task ──► FeedSubscription
//! ```
//!
//! Each live feed owns one forwarder task. Releasing the feed aborts the task
//! and decrements [`InMemoryChain::active_feeds`].
//!
//! ## Fault Injection
//!
//! - [`InMemoryChain::fail_fetches`]: every page fetch fails with the given error
//! - [`InMemoryChain::set_fetch_delay`]: page fetches sleep before answering
//! - [`InMemoryChain::drop_feeds`]: every feed on a network errors out

use crate::events::{ChainEvent, EventFilter, EventTopic};
use crate::publisher::InMemoryEventBus;
use crate::subscriber::Subscription;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use shared_types::entities::{
    Block, BlockNumber, EntityKind, Event, Extrinsic, FilterSet, ListResponse, NetworkId, PageKey,
};
use shared_types::errors::TransportError;
use shared_types::ordering::{sort_items, NewestFirst, Sequenced};
use shared_types::transport::{
    BlockStateSource, FeedSubscription, HeadNumberSource, LiveFeed, PagedQuery,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Bus capacity for chain feeds.
const CHAIN_BUS_CAPACITY: usize = 4096;

/// Records of one network.
#[derive(Debug, Default)]
pub struct NetworkLedger {
    extrinsics: Vec<Extrinsic>,
    events: Vec<Event>,
    blocks: BTreeMap<BlockNumber, Block>,
    head: BlockNumber,
}

/// A record kind the chain can page and feed.
pub trait ChainRecord: Sequenced + Serialize + Clone + Send + Sync + 'static {
    /// Entity kind served for this record type.
    const KIND: EntityKind;

    /// Bus topic carrying new records of this type.
    const TOPIC: EventTopic;

    /// Stored records of this type.
    fn stored(ledger: &NetworkLedger) -> &[Self];

    /// Extract a record of this type from a bus event.
    fn from_event(event: ChainEvent) -> Option<Self>;
}

impl ChainRecord for Extrinsic {
    const KIND: EntityKind = EntityKind::Extrinsic;
    const TOPIC: EventTopic = EventTopic::Extrinsics;

    fn stored(ledger: &NetworkLedger) -> &[Self] {
        &ledger.extrinsics
    }

    fn from_event(event: ChainEvent) -> Option<Self> {
        match event {
            ChainEvent::ExtrinsicIncluded { extrinsic, .. } => Some(extrinsic),
            _ => None,
        }
    }
}

impl ChainRecord for Event {
    const KIND: EntityKind = EntityKind::Event;
    const TOPIC: EventTopic = EventTopic::Events;

    fn stored(ledger: &NetworkLedger) -> &[Self] {
        &ledger.events
    }

    fn from_event(event: ChainEvent) -> Option<Self> {
        match event {
            ChainEvent::EventEmitted { event, .. } => Some(event),
            _ => None,
        }
    }
}

/// In-process chain backing every transport port.
pub struct InMemoryChain {
    bus: Arc<InMemoryEventBus>,
    networks: RwLock<HashMap<NetworkId, NetworkLedger>>,
    fetch_failure: RwLock<Option<TransportError>>,
    fetch_delay: RwLock<Option<Duration>>,
    fetch_calls: AtomicUsize,
    active_feeds: Arc<AtomicUsize>,
}

impl InMemoryChain {
    /// Create a chain with no networks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bus: Arc::new(InMemoryEventBus::with_capacity(CHAIN_BUS_CAPACITY)),
            networks: RwLock::new(HashMap::new()),
            fetch_failure: RwLock::new(None),
            fetch_delay: RwLock::new(None),
            fetch_calls: AtomicUsize::new(0),
            active_feeds: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a chain that already hosts the given networks.
    #[must_use]
    pub fn with_networks<I, N>(networks: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<NetworkId>,
    {
        let chain = Self::new();
        for network in networks {
            chain.add_network(network.into());
        }
        chain
    }

    /// Host a network. Existing data is kept.
    pub fn add_network(&self, network: NetworkId) {
        self.networks.write().entry(network).or_default();
    }

    /// Whether the network is hosted.
    #[must_use]
    pub fn has_network(&self, network: &NetworkId) -> bool {
        self.networks.read().contains_key(network)
    }

    /// The event bus writes are published on.
    #[must_use]
    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Include an extrinsic. Hosts the network if needed.
    pub fn push_extrinsic(&self, network: &NetworkId, extrinsic: Extrinsic) {
        self.networks
            .write()
            .entry(network.clone())
            .or_default()
            .extrinsics
            .push(extrinsic.clone());
        self.bus.send(ChainEvent::ExtrinsicIncluded {
            network: network.clone(),
            extrinsic,
        });
    }

    /// Emit a runtime event. Hosts the network if needed.
    pub fn push_event(&self, network: &NetworkId, event: Event) {
        self.networks
            .write()
            .entry(network.clone())
            .or_default()
            .events
            .push(event.clone());
        self.bus.send(ChainEvent::EventEmitted {
            network: network.clone(),
            event,
        });
    }

    /// Store or replace the state of a block.
    pub fn put_block(&self, network: &NetworkId, block: Block) {
        self.networks
            .write()
            .entry(network.clone())
            .or_default()
            .blocks
            .insert(block.number, block.clone());
        self.bus.send(ChainEvent::BlockUpdated {
            network: network.clone(),
            block,
        });
    }

    /// Mark a stored block finalized. Returns `false` if the block is unknown.
    pub fn finalize_block(&self, network: &NetworkId, number: BlockNumber) -> bool {
        let block = {
            let mut networks = self.networks.write();
            let Some(block) = networks
                .get_mut(network)
                .and_then(|ledger| ledger.blocks.get_mut(&number))
            else {
                return false;
            };
            block.finalized = true;
            block.clone()
        };
        self.bus.send(ChainEvent::BlockUpdated {
            network: network.clone(),
            block,
        });
        true
    }

    /// Move the head.
    pub fn set_head(&self, network: &NetworkId, number: BlockNumber) {
        self.networks
            .write()
            .entry(network.clone())
            .or_default()
            .head = number;
        self.bus.send(ChainEvent::HeadAdvanced {
            network: network.clone(),
            number,
        });
    }

    /// Current head of a network, if hosted.
    #[must_use]
    pub fn head(&self, network: &NetworkId) -> Option<BlockNumber> {
        self.networks.read().get(network).map(|ledger| ledger.head)
    }

    // =========================================================================
    // FAULTS AND PROBES
    // =========================================================================

    /// Make every page fetch fail with `error` until cleared with `None`.
    pub fn fail_fetches(&self, error: Option<TransportError>) {
        *self.fetch_failure.write() = error;
    }

    /// Delay every page fetch until cleared with `None`.
    pub fn set_fetch_delay(&self, delay: Option<Duration>) {
        *self.fetch_delay.write() = delay;
    }

    /// Break every live feed on a network.
    pub fn drop_feeds(&self, network: &NetworkId, reason: impl Into<String>) {
        let reason = reason.into();
        info!(network = %network, reason = %reason, "Dropping live feeds");
        self.bus.send(ChainEvent::FeedsDropped {
            network: network.clone(),
            reason,
        });
    }

    /// Feeds handed out and not yet released.
    #[must_use]
    pub fn active_feeds(&self) -> usize {
        self.active_feeds.load(Ordering::SeqCst)
    }

    /// Page fetches served so far, failed ones included.
    #[must_use]
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn ensure_hosted(&self, network: &NetworkId) -> Result<(), TransportError> {
        if self.has_network(network) {
            Ok(())
        } else {
            Err(TransportError::UnknownNetwork(network.clone()))
        }
    }

    fn page_of<T: ChainRecord>(
        &self,
        network: &NetworkId,
        filters: &FilterSet,
        page_size: usize,
        page_key: Option<&PageKey>,
    ) -> Result<ListResponse<T>, TransportError> {
        let offset = match page_key {
            None => 0,
            Some(key) => key
                .as_str()
                .parse::<usize>()
                .map_err(|_| TransportError::InvalidPageKey(key.to_string()))?,
        };

        let networks = self.networks.read();
        let ledger = networks
            .get(network)
            .ok_or_else(|| TransportError::UnknownNetwork(network.clone()))?;

        let mut matching: Vec<T> = T::stored(ledger)
            .iter()
            .filter(|record| matches_filters(*record, filters))
            .cloned()
            .collect();
        drop(networks);
        sort_items(&mut matching, &NewestFirst);

        let page_size = page_size.max(1);
        let end = offset.saturating_add(page_size).min(matching.len());
        let objects = matching
            .get(offset..end)
            .map(<[T]>::to_vec)
            .unwrap_or_default();
        let next_page_key = (end < matching.len()).then(|| PageKey::new(end.to_string()));

        Ok(ListResponse {
            objects,
            next_page_key,
        })
    }

    /// Open a feed fed by a forwarder task.
    ///
    /// The bus subscription is taken before returning so no write made after
    /// the caller's `subscribe` resolves is missed.
    fn open_feed<T, F>(
        &self,
        network: &NetworkId,
        topic: EventTopic,
        initial: Option<T>,
        project: F,
    ) -> FeedSubscription<T>
    where
        T: Send + 'static,
        F: FnMut(ChainEvent) -> Option<T> + Send + 'static,
    {
        let subscription = self.bus.subscribe(
            EventFilter::topics(vec![topic, EventTopic::Faults]).on_network(network.clone()),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(item) = initial {
            let _ = tx.send(Ok(item));
        }

        let forwarder = tokio::spawn(forward(subscription, tx, project));

        let active = self.active_feeds.clone();
        active.fetch_add(1, Ordering::SeqCst);
        debug!(network = %network, topic = ?topic, "Live feed opened");

        FeedSubscription::new(rx, move || {
            forwarder.abort();
            active.fetch_sub(1, Ordering::SeqCst);
        })
    }
}

impl Default for InMemoryChain {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_filters<T: Serialize>(record: &T, filters: &FilterSet) -> bool {
    if filters.is_empty() {
        return true;
    }
    serde_json::to_value(record)
        .map(|value| filters.matches(&value))
        .unwrap_or(false)
}

async fn forward<T, F>(
    mut subscription: Subscription,
    tx: mpsc::UnboundedSender<Result<T, TransportError>>,
    mut project: F,
) where
    F: FnMut(ChainEvent) -> Option<T>,
{
    while let Some(event) = subscription.recv().await {
        if let ChainEvent::FeedsDropped { reason, .. } = event {
            let _ = tx.send(Err(TransportError::Disconnected(reason)));
            return;
        }
        if let Some(item) = project(event) {
            if tx.send(Ok(item)).is_err() {
                return;
            }
        }
    }
}

#[async_trait]
impl<T: ChainRecord> PagedQuery<T> for InMemoryChain {
    async fn fetch(
        &self,
        network: &NetworkId,
        kind: EntityKind,
        filters: &FilterSet,
        page_size: usize,
        page_key: Option<&PageKey>,
    ) -> Result<ListResponse<T>, TransportError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.fetch_delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.fetch_failure.read().clone();
        if let Some(error) = failure {
            return Err(error);
        }
        if kind != T::KIND {
            return Err(TransportError::Unsupported(kind));
        }

        self.page_of(network, filters, page_size, page_key)
    }
}

#[async_trait]
impl<T: ChainRecord> LiveFeed<T> for InMemoryChain {
    async fn subscribe(
        &self,
        network: &NetworkId,
        kind: EntityKind,
        filters: &FilterSet,
    ) -> Result<FeedSubscription<T>, TransportError> {
        self.ensure_hosted(network)?;
        if kind != T::KIND {
            return Err(TransportError::Unsupported(kind));
        }

        let filters = filters.clone();
        Ok(self.open_feed(network, T::TOPIC, None, move |event| {
            T::from_event(event).filter(|record| matches_filters(record, &filters))
        }))
    }
}

#[async_trait]
impl BlockStateSource for InMemoryChain {
    async fn watch_block(
        &self,
        network: &NetworkId,
        number: BlockNumber,
    ) -> Result<FeedSubscription<Block>, TransportError> {
        let current = {
            let networks = self.networks.read();
            let ledger = networks
                .get(network)
                .ok_or_else(|| TransportError::UnknownNetwork(network.clone()))?;
            ledger.blocks.get(&number).cloned()
        };

        Ok(self.open_feed(network, EventTopic::Blocks, current, move |event| {
            match event {
                ChainEvent::BlockUpdated { block, .. } if block.number == number => Some(block),
                _ => None,
            }
        }))
    }
}

#[async_trait]
impl HeadNumberSource for InMemoryChain {
    async fn watch_head(
        &self,
        network: &NetworkId,
    ) -> Result<FeedSubscription<BlockNumber>, TransportError> {
        let head = self
            .head(network)
            .ok_or_else(|| TransportError::UnknownNetwork(network.clone()))?;

        Ok(self.open_feed(network, EventTopic::Head, Some(head), |event| match event {
            ChainEvent::HeadAdvanced { number, .. } => Some(number),
            _ => None,
        }))
    }
}
