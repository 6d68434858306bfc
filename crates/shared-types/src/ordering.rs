//! # Ordering and Identity
//!
//! Shared ordering utilities for explorer records. A list needs two things
//! from its items: a rank (which item comes first) and an identity (which
//! items are "the same" record). Both are supplied through [`ItemOrdering`].
//!
//! The reference ranking is [`NewestFirst`]: descending by block number, then
//! descending by position within the block.

use crate::entities::{BlockNumber, Event, Extrinsic};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Records addressed by block number plus position within the block.
pub trait Sequenced {
    /// Block the record belongs to.
    fn block_number(&self) -> BlockNumber;

    /// Position of the record within its block.
    fn index_in_block(&self) -> u32;

    /// Composite identity key.
    fn item_key(&self) -> ItemKey {
        ItemKey {
            block_number: self.block_number(),
            index: self.index_in_block(),
        }
    }
}

impl Sequenced for Extrinsic {
    fn block_number(&self) -> BlockNumber {
        self.block_number
    }

    fn index_in_block(&self) -> u32 {
        self.extrinsic_idx
    }
}

impl Sequenced for Event {
    fn block_number(&self) -> BlockNumber {
        self.block_number
    }

    fn index_in_block(&self) -> u32 {
        self.event_idx
    }
}

/// Identity of a sequenced record.
///
/// Displays as `"{block}-{index}"`, the key list renderers track rows by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    /// Block number.
    pub block_number: BlockNumber,
    /// Position within the block.
    pub index: u32,
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.block_number, self.index)
    }
}

/// Rank and identity of list items.
///
/// `compare(a, b) == Less` means `a` is listed before `b`. The comparator
/// must be a total order over distinct identities: two items that are not
/// `same_item` must not compare `Equal`.
pub trait ItemOrdering<T>: Send + Sync {
    /// Relative rank of two items.
    fn compare(&self, a: &T, b: &T) -> Ordering;

    /// Whether two items are the same record.
    fn same_item(&self, a: &T, b: &T) -> bool;
}

/// Highest block first, then highest index first.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewestFirst;

impl<T: Sequenced> ItemOrdering<T> for NewestFirst {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        b.block_number()
            .cmp(&a.block_number())
            .then_with(|| b.index_in_block().cmp(&a.index_in_block()))
    }

    fn same_item(&self, a: &T, b: &T) -> bool {
        a.item_key() == b.item_key()
    }
}

/// Lowest block first, then lowest index first. Used for per-block detail
/// listings where records read in execution order.
#[derive(Debug, Clone, Copy, Default)]
pub struct OldestFirst;

impl<T: Sequenced> ItemOrdering<T> for OldestFirst {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.item_key().cmp(&b.item_key())
    }

    fn same_item(&self, a: &T, b: &T) -> bool {
        a.item_key() == b.item_key()
    }
}

/// Caller-supplied comparator and equality closures.
pub struct FnOrdering<C, E> {
    compare: C,
    same: E,
}

impl<C, E> FnOrdering<C, E> {
    /// Build an ordering from a comparator and an identity predicate.
    pub fn new(compare: C, same: E) -> Self {
        Self { compare, same }
    }
}

impl<C, E> fmt::Debug for FnOrdering<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOrdering").finish_non_exhaustive()
    }
}

impl<T, C, E> ItemOrdering<T> for FnOrdering<C, E>
where
    C: Fn(&T, &T) -> Ordering + Send + Sync,
    E: Fn(&T, &T) -> bool + Send + Sync,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.compare)(a, b)
    }

    fn same_item(&self, a: &T, b: &T) -> bool {
        (self.same)(a, b)
    }
}

/// Sort records in place with the given ordering.
pub fn sort_items<T, O: ItemOrdering<T>>(items: &mut [T], ordering: &O) {
    items.sort_by(|a, b| ordering.compare(a, b));
}
