//! # Chain Events
//!
//! Defines all event types that flow through the shared bus. An in-process
//! chain publishes one event per write; live feeds are projections of this
//! stream onto one network and one record kind.

use serde::{Deserialize, Serialize};
use shared_types::entities::{Block, BlockNumber, Event, Extrinsic, NetworkId};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainEvent {
    // =========================================================================
    // RECORDS
    // =========================================================================
    /// An extrinsic was included in a block.
    ExtrinsicIncluded {
        /// Network the extrinsic belongs to.
        network: NetworkId,
        /// The included extrinsic.
        extrinsic: Extrinsic,
    },

    /// A runtime event was emitted.
    EventEmitted {
        /// Network the event belongs to.
        network: NetworkId,
        /// The emitted event.
        event: Event,
    },

    // =========================================================================
    // BLOCK STATE
    // =========================================================================
    /// The known state of a block changed (new, or finalized).
    BlockUpdated {
        /// Network the block belongs to.
        network: NetworkId,
        /// Latest state of the block.
        block: Block,
    },

    /// The chain head moved.
    HeadAdvanced {
        /// Network whose head moved.
        network: NetworkId,
        /// New head block number.
        number: BlockNumber,
    },

    // =========================================================================
    // FAULTS
    // =========================================================================
    /// Every live feed on the network lost its connection.
    FeedsDropped {
        /// Network whose feeds were dropped.
        network: NetworkId,
        /// Human-readable cause.
        reason: String,
    },
}

impl ChainEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::ExtrinsicIncluded { .. } => EventTopic::Extrinsics,
            Self::EventEmitted { .. } => EventTopic::Events,
            Self::BlockUpdated { .. } => EventTopic::Blocks,
            Self::HeadAdvanced { .. } => EventTopic::Head,
            Self::FeedsDropped { .. } => EventTopic::Faults,
        }
    }

    /// Network the event is scoped to.
    #[must_use]
    pub fn network(&self) -> &NetworkId {
        match self {
            Self::ExtrinsicIncluded { network, .. }
            | Self::EventEmitted { network, .. }
            | Self::BlockUpdated { network, .. }
            | Self::HeadAdvanced { network, .. }
            | Self::FeedsDropped { network, .. } => network,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Extrinsic inclusion.
    Extrinsics,
    /// Runtime events.
    Events,
    /// Block state changes.
    Blocks,
    /// Head number changes.
    Head,
    /// Connection faults. Every feed subscribes to these.
    Faults,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Networks to include. Empty means all networks.
    pub networks: Vec<NetworkId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            networks: Vec::new(),
        }
    }

    /// Restrict the filter to one network.
    #[must_use]
    pub fn on_network(mut self, network: NetworkId) -> Self {
        self.networks.push(network);
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ChainEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let network_match = self.networks.is_empty() || self.networks.contains(event.network());

        topic_match && network_match
    }
}
