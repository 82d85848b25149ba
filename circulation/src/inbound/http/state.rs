//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on the lending driving ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{LendingCommand, LendingQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub commands: Arc<dyn LendingCommand>,
    pub queries: Arc<dyn LendingQuery>,
}

impl HttpState {
    /// Construct state from the lending driving ports.
    pub fn new(commands: Arc<dyn LendingCommand>, queries: Arc<dyn LendingQuery>) -> Self {
        Self { commands, queries }
    }
}
