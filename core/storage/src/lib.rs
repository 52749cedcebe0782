//! Profile record storage for FinVault.
//!
//! This module provides a trait-based interface for the opaque local store
//! the vault persists profile records into. The store sees only opaque
//! bytes keyed by profile id; envelope internals never leak into it.
//!
//! # Design Principles
//! - Store isolation: no vault or crypto logic in store implementations
//! - Async operations: all I/O is async
//! - Atomic replace: record updates are all-or-nothing

pub mod local;
pub mod memory;
pub mod store;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use store::ProfileStore;
