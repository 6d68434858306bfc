//! # Tracked Block
//!
//! Latest known state of one block plus the chain head.
//!
//! ## State Machine
//!
//! ```text
//!                 block emission (finalized = false)
//!                 head emission (> 0)
//!                ┌──────────┐
//!                ▼          │
//!          ┌───────────┐    │        block emission (finalized = true)
//!   ──────►│ OBSERVING │────┴──────────────────────────────┐
//!          └───────────┘                                   ▼
//!                                                   ┌───────────┐
//!                                                   │ FINALIZED │ (terminal)
//!                                                   └───────────┘
//! ```
//!
//! Finalization is decided by the block emission's `finalized` flag only,
//! never by comparing against the head number. Once finalized, every
//! further emission is ignored.

use shared_types::entities::{Block, BlockNumber};

/// Effect of applying an emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed (other block, already finalized, or no-op head).
    Ignored,
    /// State updated, still observing.
    Updated,
    /// The block became finalized. Returned at most once.
    Finalized,
}

/// Mutable cell for the observed block.
#[derive(Debug, Clone)]
pub struct TrackedBlock {
    number: BlockNumber,
    block: Option<Block>,
    head_number: Option<BlockNumber>,
    finalized: bool,
}

impl TrackedBlock {
    /// Track `number`; nothing known yet.
    #[must_use]
    pub fn new(number: BlockNumber) -> Self {
        Self {
            number,
            block: None,
            head_number: None,
            finalized: false,
        }
    }

    /// Apply a block-state emission.
    pub fn apply_block(&mut self, block: Block) -> Transition {
        if self.finalized || block.number != self.number {
            return Transition::Ignored;
        }
        let finalized = block.finalized;
        self.block = Some(block);
        if finalized {
            self.finalized = true;
            Transition::Finalized
        } else {
            Transition::Updated
        }
    }

    /// Apply a head-number emission.
    ///
    /// A head of `0` means the source has not synced yet and is ignored.
    pub fn apply_head(&mut self, head_number: BlockNumber) -> Transition {
        if self.finalized || head_number == 0 || self.head_number == Some(head_number) {
            return Transition::Ignored;
        }
        self.head_number = Some(head_number);
        Transition::Updated
    }

    /// Tracked block number.
    #[must_use]
    pub fn number(&self) -> BlockNumber {
        self.number
    }

    /// Latest block state, once one was seen.
    #[must_use]
    pub fn block(&self) -> Option<&Block> {
        self.block.as_ref()
    }

    /// Latest head number, once a non-zero one was seen.
    #[must_use]
    pub fn head_number(&self) -> Option<BlockNumber> {
        self.head_number
    }

    /// Blocks between the tracked block and the head.
    #[must_use]
    pub fn blocks_behind(&self) -> Option<u64> {
        self.head_number
            .map(|head| head.saturating_sub(self.number))
    }

    /// Whether the finalized transition happened.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}
