//! # Core Domain Entities
//!
//! Defines the explorer records the synchronization core reads, plus the
//! query-side value types shared by every subsystem.
//!
//! ## Clusters
//!
//! - **Chain records**: `Block`, `Extrinsic`, `Event`
//! - **Query**: `EntityKind`, `FilterSet`, `PageKey`, `ListResponse`
//! - **Scope**: `NetworkId`, `BlockNumber`
//!
//! Records serialize camelCase so that `FilterSet` keys (`blockNumber`,
//! `callModule`, `signed`, ...) address the same fields the remote API uses.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// CLUSTER A: SCOPE
// =============================================================================

/// Height of a block in the chain.
pub type BlockNumber = u64;

/// Identifier of the network (chain) all queries are scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct NetworkId(String);

impl NetworkId {
    /// Wrap a network name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The raw network name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty identifier means "no network selected".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NetworkId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NetworkId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// =============================================================================
// CLUSTER B: QUERY
// =============================================================================

/// Kind of record a page fetch or live feed is about.
///
/// Inherents are not a separate kind: they are extrinsics queried with
/// `signed = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    /// Block headers and their finalization state.
    Block,
    /// Extrinsics, signed or not.
    Extrinsic,
    /// Runtime events.
    Event,
}

impl EntityKind {
    /// Stable lowercase name, used in logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Extrinsic => "extrinsic",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque continuation token returned by a page fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageKey(pub String);

impl PageKey {
    /// Wrap a continuation token.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of records plus the key for the next page, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    /// Records in this page.
    pub objects: Vec<T>,
    /// Continuation key; `None` on the last page.
    pub next_page_key: Option<PageKey>,
}

impl<T> ListResponse<T> {
    /// A page with no continuation.
    pub fn last(objects: Vec<T>) -> Self {
        Self {
            objects,
            next_page_key: None,
        }
    }

    /// A page followed by more pages.
    pub fn with_next(objects: Vec<T>, next_page_key: PageKey) -> Self {
        Self {
            objects,
            next_page_key: Some(next_page_key),
        }
    }

    /// An empty, final page.
    pub fn empty() -> Self {
        Self::last(Vec::new())
    }

    /// Whether another page can be requested.
    pub fn has_more(&self) -> bool {
        self.next_page_key.is_some()
    }
}

/// Filter key selecting the records of one block.
pub const BLOCK_NUMBER_FILTER: &str = "blockNumber";

/// Query constraints passed verbatim to page fetches and live feeds.
///
/// Keys are record field names in camelCase; values are compared for JSON
/// equality by implementations that filter locally.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet(BTreeMap<String, serde_json::Value>);

impl FilterSet {
    /// No constraints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Constraints selecting the extrinsics or events of block `number`.
    #[must_use]
    pub fn for_block(number: BlockNumber) -> Self {
        Self::new().with(BLOCK_NUMBER_FILTER, number)
    }

    /// Set a constraint, replacing any previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Remove a constraint.
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.0.remove(key)
    }

    /// Look up a constraint.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Number of constraints.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing is constrained.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate constraints in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }

    /// Check a serialized record against every constraint.
    ///
    /// A constraint on a field the record does not have never matches.
    pub fn matches(&self, record: &serde_json::Value) -> bool {
        self.0
            .iter()
            .all(|(key, expected)| record.get(key) == Some(expected))
    }
}

// =============================================================================
// CLUSTER C: CHAIN RECORDS
// =============================================================================

/// Latest known state of one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Block number.
    pub number: BlockNumber,
    /// Block hash (hex).
    pub hash: String,
    /// Parent block hash (hex).
    pub parent_hash: String,
    /// Whether the block's inclusion is irreversible.
    pub finalized: bool,
    /// Number of extrinsics in the block, when known.
    pub extrinsics_count: Option<u32>,
    /// Number of events emitted by the block, when known.
    pub events_count: Option<u32>,
    /// Block timestamp (ISO 8601), when known.
    pub datetime: Option<String>,
}

/// An extrinsic (signed transaction or inherent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Extrinsic {
    /// Block the extrinsic was included in.
    pub block_number: BlockNumber,
    /// Position within the block.
    pub extrinsic_idx: u32,
    /// Extrinsic hash (hex), when known.
    pub hash: Option<String>,
    /// Pallet name.
    pub call_module: String,
    /// Call name within the pallet.
    pub call_name: String,
    /// `1` for signed extrinsics, `0` for inherents.
    pub signed: u8,
    /// Signer account, for signed extrinsics.
    pub account_id: Option<String>,
    /// Block timestamp (ISO 8601), when known.
    pub block_datetime: Option<String>,
}

impl Extrinsic {
    /// Inherents are unsigned extrinsics.
    #[must_use]
    pub fn is_inherent(&self) -> bool {
        self.signed == 0
    }
}

/// A runtime event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Block that emitted the event.
    pub block_number: BlockNumber,
    /// Position within the block's events.
    pub event_idx: u32,
    /// Extrinsic that caused the event, if any.
    pub extrinsic_idx: Option<u32>,
    /// Pallet name.
    pub event_module: String,
    /// Event name within the pallet.
    pub event_name: String,
    /// Block timestamp (ISO 8601), when known.
    pub block_datetime: Option<String>,
}
