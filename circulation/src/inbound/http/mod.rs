//! HTTP inbound adapter exposing the lending REST endpoints.

pub mod copies;
pub mod error;
pub mod health;
pub mod identity;
pub mod state;
pub mod validation;

pub use crate::domain::ApiResult;
