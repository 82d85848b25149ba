//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern, providing concrete
//! implementations of domain port traits for infrastructure concerns:
//!
//! - **persistence**: in-process reference stores for copies, the activity
//!   log, and the fine ledger
//! - **payments**: HTTP payment-confirmation provider plus an
//!   always-confirming fixture for local wiring
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod payments;
pub mod persistence;
