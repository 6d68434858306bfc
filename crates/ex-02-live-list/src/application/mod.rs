//! # Application Layer
//!
//! The live list controller orchestrating feed, pages and lifecycle.

pub mod service;

pub use service::LiveListController;
