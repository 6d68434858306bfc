//! # Live List Metrics
//!
//! Prometheus counters for list merge activity and failures.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! ex-02-live-list = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `live_list_items_total` - Counter of merged items, labeled by kind and outcome
//!   (`inserted`, `duplicate`, `discarded`, `evicted`)
//! - `live_list_stale_completions_total` - Counter of completions discarded after a reset
//! - `live_list_failures_total` - Counter of failures, labeled by kind and source
//!   (`fetch`, `subscription`)
//! - `live_list_generations_total` - Counter of list resets

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

use crate::domain::MergeSummary;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Items merged, labeled by entity kind and outcome
    pub static ref ITEMS: Option<IntCounterVec> = register_int_counter_vec!(
        "live_list_items_total",
        "Total number of items merged into live lists",
        &["kind", "outcome"]
    )
    .ok();

    /// Completions discarded because their generation was superseded
    pub static ref STALE_COMPLETIONS: Option<IntCounter> = register_int_counter!(
        "live_list_stale_completions_total",
        "Total number of fetch or feed completions discarded as stale"
    )
    .ok();

    /// Failures, labeled by entity kind and source
    pub static ref FAILURES: Option<IntCounterVec> = register_int_counter_vec!(
        "live_list_failures_total",
        "Total number of fetch and subscription failures",
        &["kind", "source"]
    )
    .ok();

    /// List resets
    pub static ref GENERATIONS: Option<IntCounter> = register_int_counter!(
        "live_list_generations_total",
        "Total number of list generations started"
    )
    .ok();
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record the outcome of a merge
#[cfg(feature = "metrics")]
pub fn record_merge(kind: &str, summary: &MergeSummary) {
    if let Some(items) = ITEMS.as_ref() {
        for (outcome, count) in [
            ("inserted", summary.inserted),
            ("duplicate", summary.duplicates),
            ("discarded", summary.discarded),
            ("evicted", summary.evicted),
        ] {
            if count > 0 {
                items.with_label_values(&[kind, outcome]).inc_by(count as u64);
            }
        }
    }
}

/// Record a completion dropped after a reset
#[cfg(feature = "metrics")]
pub fn record_stale_completion() {
    if let Some(counter) = STALE_COMPLETIONS.as_ref() {
        counter.inc();
    }
}

/// Record a fetch or subscription failure
#[cfg(feature = "metrics")]
pub fn record_failure(kind: &str, source: &str) {
    if let Some(failures) = FAILURES.as_ref() {
        failures.with_label_values(&[kind, source]).inc();
    }
}

/// Record a list reset
#[cfg(feature = "metrics")]
pub fn record_generation() {
    if let Some(counter) = GENERATIONS.as_ref() {
        counter.inc();
    }
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_merge(_kind: &str, _summary: &MergeSummary) {}

#[cfg(not(feature = "metrics"))]
pub fn record_stale_completion() {}

#[cfg(not(feature = "metrics"))]
pub fn record_failure(_kind: &str, _source: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_generation() {}
