//! # Item List
//!
//! Bounded, strictly ordered, duplicate-free list of records.
//!
//! ## Merge Rule
//!
//! ```text
//! incoming item
//!     │
//!     ├─ same_item as an element? ──────────────► Duplicate (left in place)
//!     │
//!     ├─ rank position >= capacity? ────────────► Discarded
//!     │
//!     └─ insert at rank position
//!            └─ len > capacity? ── pop last ────► Inserted { evicted: true }
//! ```
//!
//! The rule is idempotent and order-independent: for a comparator that is a
//! total order over identities, the list always holds the `capacity`
//! highest-ranked distinct items seen so far, whatever the arrival order.

use shared_types::ordering::ItemOrdering;
use std::cmp::Ordering;
use std::fmt;

/// Result of merging one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The item entered the list.
    Inserted {
        /// Whether the lowest-ranked element was pushed out.
        evicted: bool,
    },
    /// An item with the same identity is already listed.
    Duplicate,
    /// The list is full and the item ranks below every element.
    Discarded,
}

impl MergeOutcome {
    /// Whether the list content changed.
    #[must_use]
    pub fn changed(self) -> bool {
        matches!(self, Self::Inserted { .. })
    }
}

/// Tally of a batch merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Items that entered the list.
    pub inserted: usize,
    /// Items already listed.
    pub duplicates: usize,
    /// Items ranked out of the list.
    pub discarded: usize,
    /// Elements pushed out by insertions.
    pub evicted: usize,
}

impl MergeSummary {
    /// Whether any item entered the list.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.inserted > 0
    }

    fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Inserted { evicted } => {
                self.inserted += 1;
                if evicted {
                    self.evicted += 1;
                }
            }
            MergeOutcome::Duplicate => self.duplicates += 1,
            MergeOutcome::Discarded => self.discarded += 1,
        }
    }
}

/// Ordered, bounded list of items.
pub struct ItemList<T, O> {
    items: Vec<T>,
    capacity: usize,
    ordering: O,
}

impl<T, O: ItemOrdering<T>> ItemList<T, O> {
    /// An empty list holding at most `capacity` items.
    pub fn new(capacity: usize, ordering: O) -> Self {
        Self {
            items: Vec::with_capacity(capacity.min(1024)),
            capacity,
            ordering,
        }
    }

    /// Apply the merge rule to one item.
    pub fn merge(&mut self, item: T) -> MergeOutcome {
        if self.items.iter().any(|e| self.ordering.same_item(e, &item)) {
            return MergeOutcome::Duplicate;
        }

        let position = self
            .items
            .partition_point(|e| self.ordering.compare(e, &item) != Ordering::Greater);
        if position >= self.capacity {
            return MergeOutcome::Discarded;
        }

        self.items.insert(position, item);
        let evicted = self.items.len() > self.capacity;
        if evicted {
            self.items.pop();
        }
        MergeOutcome::Inserted { evicted }
    }

    /// Apply the merge rule to every item, in order.
    pub fn merge_all(&mut self, items: impl IntoIterator<Item = T>) -> MergeSummary {
        let mut summary = MergeSummary::default();
        for item in items {
            summary.record(self.merge(item));
        }
        summary
    }

    /// Whether an item with the same identity is listed.
    pub fn contains(&self, item: &T) -> bool {
        self.items.iter().any(|e| self.ordering.same_item(e, item))
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Listed items, highest ranked first.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Iterate listed items.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Number of listed items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is listed.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The ordering in use.
    pub fn ordering(&self) -> &O {
        &self.ordering
    }
}

impl<T: Clone, O> ItemList<T, O> {
    /// Copy of the listed items.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}

impl<T: fmt::Debug, O> fmt::Debug for ItemList<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemList")
            .field("capacity", &self.capacity)
            .field("items", &self.items)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared_types::entities::{BlockNumber, Extrinsic};
    use shared_types::ordering::{NewestFirst, Sequenced};

    fn ext(block_number: BlockNumber, extrinsic_idx: u32) -> Extrinsic {
        Extrinsic {
            block_number,
            extrinsic_idx,
            ..Default::default()
        }
    }

    fn blocks(list: &ItemList<Extrinsic, NewestFirst>) -> Vec<BlockNumber> {
        list.iter().map(|e| e.block_number).collect()
    }

    #[test]
    fn test_live_feed_overflow_evicts_lowest() {
        // A(10), B(9), C(8), D(7) with capacity 3.
        let mut list = ItemList::new(3, NewestFirst);
        assert_eq!(list.merge(ext(10, 0)), MergeOutcome::Inserted { evicted: false });
        list.merge(ext(9, 0));
        list.merge(ext(8, 0));
        assert_eq!(list.merge(ext(7, 0)), MergeOutcome::Discarded);

        assert_eq!(blocks(&list), vec![10, 9, 8]);
    }

    #[test]
    fn test_higher_item_evicts_when_full() {
        let mut list = ItemList::new(3, NewestFirst);
        list.merge_all([ext(9, 0), ext(8, 0), ext(7, 0)]);

        assert_eq!(list.merge(ext(10, 0)), MergeOutcome::Inserted { evicted: true });
        assert_eq!(blocks(&list), vec![10, 9, 8]);
    }

    #[test]
    fn test_page_then_live_duplicate() {
        // Page [B, C], then live A, then live B again.
        let mut list = ItemList::new(3, NewestFirst);
        let page = list.merge_all([ext(9, 0), ext(8, 0)]);
        assert_eq!(page.inserted, 2);

        list.merge(ext(10, 0));
        assert_eq!(list.merge(ext(9, 0)), MergeOutcome::Duplicate);

        assert_eq!(blocks(&list), vec![10, 9, 8]);
    }

    #[test]
    fn test_duplicate_keeps_first_payload() {
        let mut list = ItemList::new(3, NewestFirst);
        list.merge(ext(5, 1));

        let mut changed = ext(5, 1);
        changed.call_name = "corrected".to_string();
        assert_eq!(list.merge(changed), MergeOutcome::Duplicate);
        assert_eq!(list.items()[0].call_name, "");
    }

    #[test]
    fn test_intra_block_order() {
        let mut list = ItemList::new(10, NewestFirst);
        list.merge_all([ext(4, 0), ext(5, 2), ext(5, 0), ext(5, 1)]);

        let keys: Vec<String> = list.iter().map(|e| e.item_key().to_string()).collect();
        assert_eq!(keys, vec!["5-2", "5-1", "5-0", "4-0"]);
    }

    #[test]
    fn test_summary_counts() {
        let mut list = ItemList::new(2, NewestFirst);
        let summary = list.merge_all([ext(1, 0), ext(2, 0), ext(2, 0), ext(3, 0), ext(0, 0)]);

        assert_eq!(
            summary,
            MergeSummary {
                inserted: 3,
                duplicates: 1,
                discarded: 1,
                evicted: 1,
            }
        );
        assert!(summary.changed());
    }

    #[test]
    fn test_clear() {
        let mut list = ItemList::new(2, NewestFirst);
        list.merge(ext(1, 0));
        assert!(list.contains(&ext(1, 0)));

        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.capacity(), 2);
    }

    // =========================================================================
    // PROPERTIES
    // =========================================================================

    fn arb_items() -> impl Strategy<Value = Vec<Extrinsic>> {
        prop::collection::vec((0u64..20, 0u32..4), 0..40)
            .prop_map(|keys| keys.into_iter().map(|(b, i)| ext(b, i)).collect())
    }

    /// Items, a random permutation of them, and a page/live split point.
    fn arb_arrivals() -> impl Strategy<Value = (Vec<Extrinsic>, Vec<Extrinsic>, usize)> {
        arb_items().prop_flat_map(|items| {
            let len = items.len();
            (Just(items.clone()), Just(items).prop_shuffle(), 0..=len)
        })
    }

    proptest! {
        #[test]
        fn prop_merge_is_idempotent(items in arb_items(), capacity in 1usize..10) {
            let mut once = ItemList::new(capacity, NewestFirst);
            let mut twice = ItemList::new(capacity, NewestFirst);
            for item in items {
                once.merge(item.clone());
                twice.merge(item.clone());
                twice.merge(item);
            }
            prop_assert_eq!(once.items(), twice.items());
        }

        #[test]
        fn prop_bounded_and_unique(items in arb_items(), capacity in 1usize..10) {
            let mut list = ItemList::new(capacity, NewestFirst);
            for item in items {
                list.merge(item);
                prop_assert!(list.len() <= capacity);
            }
            let keys: Vec<_> = list.iter().map(Sequenced::item_key).collect();
            let mut unique = keys.clone();
            unique.dedup();
            prop_assert_eq!(keys, unique);
        }

        #[test]
        fn prop_arrival_order_is_irrelevant(
            (items, arrival, split) in arb_arrivals(),
            capacity in 1usize..10,
        ) {
            let mut reference = ItemList::new(capacity, NewestFirst);
            reference.merge_all(items);

            // A page lands first, then the rest arrives live one at a time.
            let mut interleaved = ItemList::new(capacity, NewestFirst);
            let (page, live) = arrival.split_at(split);
            interleaved.merge_all(page.iter().cloned());
            for item in live {
                interleaved.merge(item.clone());
            }

            prop_assert_eq!(reference.items(), interleaved.items());
        }
    }
}
