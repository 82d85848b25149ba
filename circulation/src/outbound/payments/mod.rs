//! Payment confirmation adapters.
//!
//! Implements the `PaymentGateway` port twice: `HttpPaymentGateway` speaks to
//! a real provider over HTTP with bounded timeouts, `FixturePaymentGateway`
//! confirms everything for local wiring and tests.

mod fixture_gateway;
mod http_gateway;

pub use fixture_gateway::FixturePaymentGateway;
pub use http_gateway::HttpPaymentGateway;
