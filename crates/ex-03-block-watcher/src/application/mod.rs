//! Application layer: the watcher service.

pub mod service;

pub use service::FinalizationWatcher;
