//! # Domain Layer
//!
//! Core list types: the bounded item list, lifecycle status, events and
//! errors.

pub mod errors;
pub mod events;
pub mod item_list;
pub mod status;

pub use errors::{FetchError, ListError, ListFailure, SubscriptionError};
pub use events::ListEvent;
pub use item_list::{ItemList, MergeOutcome, MergeSummary};
pub use status::{ListSnapshot, ListStatus};
