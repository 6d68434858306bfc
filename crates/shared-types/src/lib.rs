//! # Shared Types Crate
//!
//! Records, query value types and transport contracts shared by every
//! explorer subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Ports, not transports**: Subsystems depend on the traits in
//!   [`transport`]; concrete RPC/WebSocket clients live outside the core.
//! - **Identity over equality**: Lists dedupe by [`ItemOrdering::same_item`],
//!   never by full structural equality.

pub mod entities;
pub mod errors;
pub mod ordering;
pub mod transport;

pub use entities::*;
pub use errors::*;
pub use ordering::*;
pub use transport::*;
