//! In-process persistence adapters.
//!
//! This module provides the reference implementations of the storage ports:
//!
//! - **Thin adapters**: Implementations only guard shared state and apply the
//!   port contract. No business logic resides here.
//! - **Conditional updates**: `MemoryCopyStore` linearises
//!   `update_if_status`, so of two racing transitions exactly one wins.
//! - **Strongly typed errors**: Lock failures are mapped to the ports'
//!   connection error variants rather than panicking.
//!
//! Database-backed adapters can replace these behind the same ports without
//! touching the domain layer.

mod memory_activity_log;
mod memory_copy_store;
mod memory_fine_ledger;

pub use memory_activity_log::MemoryActivityLog;
pub use memory_copy_store::MemoryCopyStore;
pub use memory_fine_ledger::MemoryFineLedger;
