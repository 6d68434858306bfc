//! # Explorer Sync Test Suite
//!
//! Cross-crate flows driven against the in-memory chain.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs           # Chain seeding, wait helpers, log capture
//! └── flows/
//!     ├── live_list.rs      # Pages + live feed + filters over InMemoryChain
//!     ├── network_switch.rs # follow_network across networks
//!     ├── block_detail.rs   # Finalization watcher and enrichment
//!     └── lifecycle.rs      # No feed outlives its owner
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p explorer-tests
//! cargo bench -p explorer-tests
//! ```

pub mod fixtures;
pub mod flows;
