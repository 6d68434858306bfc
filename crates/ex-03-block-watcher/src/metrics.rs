//! # Block Watcher Metrics
//!
//! Enable with the `metrics` feature.
//!
//! ## Metrics Exported
//!
//! - `block_watcher_finalizations_total` - Counter of blocks seen finalized
//! - `block_watcher_enrichment_pages_total` - Counter of enrichment pages, labeled by kind
//! - `block_watcher_failures_total` - Counter of failures, labeled by stage
//!   (`observe`, `enrich`)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Blocks observed reaching finality
    pub static ref FINALIZATIONS: Option<IntCounter> = register_int_counter!(
        "block_watcher_finalizations_total",
        "Total number of watched blocks seen finalized"
    )
    .ok();

    /// Enrichment pages fetched, labeled by entity kind
    pub static ref ENRICHMENT_PAGES: Option<IntCounterVec> = register_int_counter_vec!(
        "block_watcher_enrichment_pages_total",
        "Total number of pages fetched after finalization",
        &["kind"]
    )
    .ok();

    /// Failures, labeled by stage
    pub static ref FAILURES: Option<IntCounterVec> = register_int_counter_vec!(
        "block_watcher_failures_total",
        "Total number of feed and enrichment failures",
        &["stage"]
    )
    .ok();
}

/// Record a finalization
#[cfg(feature = "metrics")]
pub fn record_finalized() {
    if let Some(counter) = FINALIZATIONS.as_ref() {
        counter.inc();
    }
}

/// Record one enrichment page
#[cfg(feature = "metrics")]
pub fn record_enrichment_page(kind: &str) {
    if let Some(pages) = ENRICHMENT_PAGES.as_ref() {
        pages.with_label_values(&[kind]).inc();
    }
}

/// Record a failure at `stage`
#[cfg(feature = "metrics")]
pub fn record_failure(stage: &str) {
    if let Some(failures) = FAILURES.as_ref() {
        failures.with_label_values(&[stage]).inc();
    }
}

#[cfg(not(feature = "metrics"))]
pub fn record_finalized() {}

#[cfg(not(feature = "metrics"))]
pub fn record_enrichment_page(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_failure(_stage: &str) {}
