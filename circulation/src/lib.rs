//! Library copy circulation service.
//!
//! The crate is organised hexagonally: `domain` holds the lending state
//! machine, fine engine, and port traits; `inbound::http` adapts Actix
//! handlers onto the driving ports; `outbound` provides the in-memory stores
//! and payment gateway adapters behind the driven ports; `server` wires the
//! pieces into a running HTTP server.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;
#[cfg(test)]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
/// Request tracing middleware attaching a trace id to every request.
pub use middleware::Trace;
