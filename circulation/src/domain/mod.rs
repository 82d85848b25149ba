//! Domain primitives, aggregates, and services.
//!
//! Purpose: Define strongly typed lending entities used by the API and
//! persistence layers, the ports that connect them, and the services that
//! drive the copy lifecycle. Keep types immutable and document invariants and
//! serialisation contracts (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - Error / ErrorCode — API error response payload and stable identifiers.
//! - Actor / Role / UserId — caller identity and authorisation roles.
//! - CopyRecord / CopyStatus — a physical copy and its lifecycle state.
//! - ActivityRecord — append-only audit trail entries.
//! - FineAmount / FineSchedule — overdue fine policy.
//! - FinePayment / PaymentClaim — settled fines and payment claims.
//! - LendingCommandService / LendingQueryService — lifecycle orchestration.

pub mod activity;
pub mod actor;
pub mod copy;
pub mod error;
pub mod fine;
pub mod lending_service;
pub mod payment;
pub mod ports;
pub mod trace_id;

pub use self::activity::{ActivityKind, ActivityRecord};
pub use self::actor::{Actor, ActorValidationError, Role, UserId};
pub use self::copy::{
    AccessionNumber, CopyDraft, CopyId, CopyRecord, CopyStatus, CopyStatusKind,
    CopyValidationError,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::fine::{FineAmount, FineSchedule, FineValidationError};
pub use self::lending_service::{LendingCommandService, LendingQueryService};
pub use self::payment::{
    FinePayment, PaymentClaim, PaymentReference, PaymentStatus, PaymentValidationError,
};
pub use self::trace_id::TraceId;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use circulation::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
