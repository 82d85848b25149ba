//! Copy lifecycle HTTP handlers.
//!
//! ```text
//! POST /api/v1/copies
//! GET  /api/v1/copies
//! GET  /api/v1/copies/{id}
//! GET  /api/v1/copies/{id}/activity
//! POST /api/v1/copies/{id}/reserve
//! POST /api/v1/copies/{id}/cancel-reservation
//! POST /api/v1/copies/{id}/issue
//! POST /api/v1/copies/{id}/return
//! POST /api/v1/copies/{id}/pay-fine
//! PUT  /api/v1/copies/{id}/status
//! ```
//!
//! Handlers derive the caller from [`CallerIdentity`], translate wire bodies
//! into driving-port requests, and never touch the driven ports directly.

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::activity::ActivityRecord;
use crate::domain::copy::{CopyDraft, CopyRecord, CopyStatus, CopyStatusKind};
use crate::domain::payment::{PaymentClaim, PaymentReference};
use crate::domain::ports::{
    AdminCopyStatus, CancelReservationRequest, CopyPage, GetCopyRequest, IssueCopyRequest,
    ListCopiesRequest, ListCopyActivityRequest, PayFineRequest, RegisterCopyRequest,
    ReserveCopyRequest, ReturnCopyRequest, ReturnOutcome, SetCopyStatusRequest,
};
use crate::domain::{ActivityKind, ApiResult, Error, FineAmount, UserId};
use crate::inbound::http::identity::CallerIdentity;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_copy_id, parse_optional_rfc3339_timestamp, parse_uuid,
};

/// Request payload for registering a copy.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCopyBody {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub call_number: String,
    pub accession_number: String,
}

impl From<RegisterCopyBody> for CopyDraft {
    fn from(value: RegisterCopyBody) -> Self {
        Self {
            title: value.title,
            author: value.author,
            isbn: value.isbn,
            call_number: value.call_number,
            accession_number: value.accession_number,
        }
    }
}

/// Wire view of one copy; reservation and loan fields appear exactly when
/// the status carries them.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CopyBody {
    #[schema(format = "uuid")]
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub call_number: String,
    pub accession_number: String,
    pub status: CopyStatusKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(format = "uuid")]
    pub reserved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(format = "date-time")]
    pub reserved_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(format = "uuid")]
    pub issued_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(format = "date-time")]
    pub issued_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(format = "date-time")]
    pub due_date: Option<String>,
}

impl From<CopyRecord> for CopyBody {
    fn from(value: CopyRecord) -> Self {
        let mut body = Self {
            id: value.id().to_string(),
            title: value.title().to_owned(),
            author: value.author().to_owned(),
            isbn: value.isbn().to_owned(),
            call_number: value.call_number().to_owned(),
            accession_number: value.accession_number().to_string(),
            status: value.status().kind(),
            reserved_by: None,
            reserved_at: None,
            issued_to: None,
            issued_at: None,
            due_date: None,
        };
        match value.status() {
            CopyStatus::Active | CopyStatus::Deactive => {}
            CopyStatus::Reserved { by, at } => {
                body.reserved_by = Some(by.to_string());
                body.reserved_at = Some(at.to_rfc3339());
            }
            CopyStatus::Issued { to, at, due } => {
                body.issued_to = Some(to.to_string());
                body.issued_at = Some(at.to_rfc3339());
                body.due_date = Some(due.to_rfc3339());
            }
        }
        body
    }
}

/// Response payload for copy listings.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListCopiesBody {
    pub copies: Vec<CopyBody>,
}

/// Query parameters for copy listings.
#[derive(Debug, Clone, Copy, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListCopiesQuery {
    /// Records per page; defaults to 50, capped at 200.
    pub limit: Option<u32>,
    /// Records skipped from the start of the listing.
    pub offset: Option<u32>,
}

impl ListCopiesQuery {
    fn into_page(self) -> Result<CopyPage, Error> {
        match (self.limit, self.offset) {
            (None, None) => Ok(CopyPage::default()),
            (limit, offset) => CopyPage::new(
                limit.unwrap_or_else(|| CopyPage::default().limit()),
                offset.unwrap_or(0),
            )
            .map_err(|err| Error::invalid_request(err.to_string())),
        }
    }
}

/// One audit trail entry for a copy.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub copy_id: String,
    #[schema(format = "uuid")]
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    #[schema(format = "date-time")]
    pub at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fine_amount: Option<i64>,
}

impl From<ActivityRecord> for ActivityBody {
    fn from(value: ActivityRecord) -> Self {
        Self {
            id: value.id().to_string(),
            copy_id: value.copy_id().to_string(),
            user_id: value.user_id().to_string(),
            kind: value.kind(),
            at: value.at().to_rfc3339(),
            fine_amount: value.fine_amount().map(FineAmount::get),
        }
    }
}

/// Response payload for a copy's audit trail.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListActivityBody {
    pub events: Vec<ActivityBody>,
}

/// Response payload for a successful reservation.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReserveCopyBody {
    pub status: CopyStatusKind,
    #[schema(format = "date-time")]
    pub reserved_at: String,
    /// True when the copy was already reserved by the caller and the
    /// existing reservation was replayed.
    pub replayed: bool,
}

/// Response payload for a cancelled reservation.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelReservationBody {
    pub status: CopyStatusKind,
}

/// Request payload for issuing a copy at the desk.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueCopyBody {
    /// Borrower the copy is handed to.
    #[schema(format = "uuid")]
    pub user_id: String,
    /// Due date override; defaults to the configured loan period.
    #[schema(format = "date-time")]
    pub due_date: Option<String>,
}

/// Response payload for a successful issuance.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueCopyResponseBody {
    pub status: CopyStatusKind,
    #[schema(format = "date-time")]
    pub due_date: String,
}

/// Response payload for a return attempt.
///
/// A finalised return carries `returned: true`; an overdue loan instead
/// reports `requiresPayment: true` with the assessed fine and leaves the
/// copy issued.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnCopyBody {
    pub returned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_payment: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fine: Option<i64>,
}

impl From<ReturnOutcome> for ReturnCopyBody {
    fn from(value: ReturnOutcome) -> Self {
        match value {
            ReturnOutcome::Returned => Self {
                returned: true,
                requires_payment: None,
                fine: None,
            },
            ReturnOutcome::PaymentDue { fine } => Self {
                returned: false,
                requires_payment: Some(true),
                fine: Some(fine.get()),
            },
        }
    }
}

/// Request payload for settling an outstanding fine.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayFineBody {
    /// Amount the caller claims to have paid, in whole currency units.
    pub amount: i64,
    /// Provider reference identifying the payment.
    pub payment_reference: String,
}

/// Response payload for a settled fine.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayFineResponseBody {
    pub returned: bool,
    pub amount_paid: i64,
    pub payment_reference: String,
}

/// Request payload for administrative status changes.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusBody {
    pub status: AdminCopyStatus,
}

/// Response payload for administrative status changes.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusResponseBody {
    pub status: CopyStatusKind,
}

/// Register a copy in the catalogue; it enters circulation as Active.
#[utoipa::path(
    post,
    path = "/api/v1/copies",
    request_body = RegisterCopyBody,
    responses(
        (status = 201, description = "Copy registered", body = CopyBody),
        (status = 400, description = "Invalid request", body = crate::domain::Error),
        (status = 401, description = "Unauthorized", body = crate::domain::Error),
        (status = 403, description = "Forbidden", body = crate::domain::Error),
        (status = 409, description = "Duplicate accession number", body = crate::domain::Error)
    ),
    tags = ["copies"],
    operation_id = "registerCopy",
    security(("ForwardedIdentity" = []))
)]
#[post("/copies")]
pub async fn register_copy(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    payload: web::Json<RegisterCopyBody>,
) -> ApiResult<HttpResponse> {
    let response = state
        .commands
        .register_copy(RegisterCopyRequest {
            actor: caller.into_actor(),
            draft: payload.into_inner().into(),
        })
        .await?;

    Ok(HttpResponse::Created().json(CopyBody::from(response.copy)))
}

/// Fetch one copy by id.
#[utoipa::path(
    get,
    path = "/api/v1/copies/{id}",
    params(("id" = uuid::Uuid, Path, description = "Copy identifier")),
    responses(
        (status = 200, description = "Current copy view", body = CopyBody),
        (status = 401, description = "Unauthorized", body = crate::domain::Error),
        (status = 404, description = "Unknown copy", body = crate::domain::Error)
    ),
    tags = ["copies"],
    operation_id = "getCopy",
    security(("ForwardedIdentity" = []))
)]
#[get("/copies/{id}")]
pub async fn get_copy(
    state: web::Data<HttpState>,
    _caller: CallerIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<CopyBody>> {
    let copy_id = parse_copy_id(path.into_inner())?;
    let response = state.queries.get_copy(GetCopyRequest { copy_id }).await?;
    Ok(web::Json(CopyBody::from(response.copy)))
}

/// List copies in registration order for desk screens.
#[utoipa::path(
    get,
    path = "/api/v1/copies",
    params(ListCopiesQuery),
    responses(
        (status = 200, description = "Page of copies", body = ListCopiesBody),
        (status = 400, description = "Invalid page bounds", body = crate::domain::Error),
        (status = 401, description = "Unauthorized", body = crate::domain::Error)
    ),
    tags = ["copies"],
    operation_id = "listCopies",
    security(("ForwardedIdentity" = []))
)]
#[get("/copies")]
pub async fn list_copies(
    state: web::Data<HttpState>,
    _caller: CallerIdentity,
    query: web::Query<ListCopiesQuery>,
) -> ApiResult<web::Json<ListCopiesBody>> {
    let page = query.into_inner().into_page()?;
    let response = state
        .queries
        .list_copies(ListCopiesRequest { page })
        .await?;
    Ok(web::Json(ListCopiesBody {
        copies: response.copies.into_iter().map(CopyBody::from).collect(),
    }))
}

/// Read the audit trail for one copy, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/copies/{id}/activity",
    params(("id" = uuid::Uuid, Path, description = "Copy identifier")),
    responses(
        (status = 200, description = "Audit trail, newest first", body = ListActivityBody),
        (status = 401, description = "Unauthorized", body = crate::domain::Error),
        (status = 404, description = "Unknown copy", body = crate::domain::Error)
    ),
    tags = ["copies"],
    operation_id = "listCopyActivity",
    security(("ForwardedIdentity" = []))
)]
#[get("/copies/{id}/activity")]
pub async fn list_copy_activity(
    state: web::Data<HttpState>,
    _caller: CallerIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<ListActivityBody>> {
    let copy_id = parse_copy_id(path.into_inner())?;
    let response = state
        .queries
        .list_copy_activity(ListCopyActivityRequest { copy_id })
        .await?;
    Ok(web::Json(ListActivityBody {
        events: response.events.into_iter().map(ActivityBody::from).collect(),
    }))
}

/// Reserve an Active copy for the caller.
#[utoipa::path(
    post,
    path = "/api/v1/copies/{id}/reserve",
    params(("id" = uuid::Uuid, Path, description = "Copy identifier")),
    responses(
        (status = 200, description = "Copy reserved", body = ReserveCopyBody),
        (status = 401, description = "Unauthorized", body = crate::domain::Error),
        (status = 404, description = "Unknown copy", body = crate::domain::Error),
        (status = 409, description = "Copy is not Active", body = crate::domain::Error)
    ),
    tags = ["lending"],
    operation_id = "reserveCopy",
    security(("ForwardedIdentity" = []))
)]
#[post("/copies/{id}/reserve")]
pub async fn reserve_copy(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<ReserveCopyBody>> {
    let copy_id = parse_copy_id(path.into_inner())?;
    let response = state
        .commands
        .reserve(ReserveCopyRequest {
            copy_id,
            actor: caller.into_actor(),
        })
        .await?;
    Ok(web::Json(ReserveCopyBody {
        status: response.status,
        reserved_at: response.reserved_at.to_rfc3339(),
        replayed: response.replayed,
    }))
}

/// Cancel a reservation, returning the copy to Active.
#[utoipa::path(
    post,
    path = "/api/v1/copies/{id}/cancel-reservation",
    params(("id" = uuid::Uuid, Path, description = "Copy identifier")),
    responses(
        (status = 200, description = "Reservation cancelled", body = CancelReservationBody),
        (status = 401, description = "Unauthorized", body = crate::domain::Error),
        (status = 403, description = "Not the holder or desk staff", body = crate::domain::Error),
        (status = 404, description = "Unknown copy", body = crate::domain::Error),
        (status = 409, description = "No reservation to cancel", body = crate::domain::Error)
    ),
    tags = ["lending"],
    operation_id = "cancelReservation",
    security(("ForwardedIdentity" = []))
)]
#[post("/copies/{id}/cancel-reservation")]
pub async fn cancel_reservation(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<CancelReservationBody>> {
    let copy_id = parse_copy_id(path.into_inner())?;
    let response = state
        .commands
        .cancel_reservation(CancelReservationRequest {
            copy_id,
            actor: caller.into_actor(),
        })
        .await?;
    Ok(web::Json(CancelReservationBody {
        status: response.status,
    }))
}

/// Issue a copy to a borrower, starting the loan period.
#[utoipa::path(
    post,
    path = "/api/v1/copies/{id}/issue",
    params(("id" = uuid::Uuid, Path, description = "Copy identifier")),
    request_body = IssueCopyBody,
    responses(
        (status = 200, description = "Copy issued", body = IssueCopyResponseBody),
        (status = 400, description = "Invalid request", body = crate::domain::Error),
        (status = 401, description = "Unauthorized", body = crate::domain::Error),
        (status = 403, description = "Caller is not desk staff", body = crate::domain::Error),
        (status = 404, description = "Unknown copy", body = crate::domain::Error),
        (status = 409, description = "Copy unavailable to this borrower", body = crate::domain::Error)
    ),
    tags = ["lending"],
    operation_id = "issueCopy",
    security(("ForwardedIdentity" = []))
)]
#[post("/copies/{id}/issue")]
pub async fn issue_copy(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
    payload: web::Json<IssueCopyBody>,
) -> ApiResult<web::Json<IssueCopyResponseBody>> {
    let copy_id = parse_copy_id(path.into_inner())?;
    let IssueCopyBody { user_id, due_date } = payload.into_inner();
    let borrower =
        UserId::from_uuid(parse_uuid(user_id, FieldName::new("userId"))?);
    let due_date = parse_optional_rfc3339_timestamp(due_date, FieldName::new("dueDate"))?;

    let response = state
        .commands
        .issue(IssueCopyRequest {
            copy_id,
            actor: caller.into_actor(),
            borrower,
            due_date,
        })
        .await?;
    Ok(web::Json(IssueCopyResponseBody {
        status: response.status,
        due_date: response.due_date.to_rfc3339(),
    }))
}

/// Return an issued copy, assessing any overdue fine first.
#[utoipa::path(
    post,
    path = "/api/v1/copies/{id}/return",
    params(("id" = uuid::Uuid, Path, description = "Copy identifier")),
    responses(
        (status = 200, description = "Return outcome", body = ReturnCopyBody),
        (status = 401, description = "Unauthorized", body = crate::domain::Error),
        (status = 403, description = "Not the borrower or desk staff", body = crate::domain::Error),
        (status = 404, description = "Unknown copy", body = crate::domain::Error),
        (status = 409, description = "Copy is not issued", body = crate::domain::Error)
    ),
    tags = ["lending"],
    operation_id = "returnCopy",
    security(("ForwardedIdentity" = []))
)]
#[post("/copies/{id}/return")]
pub async fn return_copy(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<ReturnCopyBody>> {
    let copy_id = parse_copy_id(path.into_inner())?;
    let response = state
        .commands
        .return_copy(ReturnCopyRequest {
            copy_id,
            actor: caller.into_actor(),
        })
        .await?;
    Ok(web::Json(ReturnCopyBody::from(response.outcome)))
}

/// Settle an outstanding fine and finalise the return.
#[utoipa::path(
    post,
    path = "/api/v1/copies/{id}/pay-fine",
    params(("id" = uuid::Uuid, Path, description = "Copy identifier")),
    request_body = PayFineBody,
    responses(
        (status = 200, description = "Fine settled and copy returned", body = PayFineResponseBody),
        (status = 400, description = "Invalid request", body = crate::domain::Error),
        (status = 401, description = "Unauthorized", body = crate::domain::Error),
        (status = 402, description = "Claim does not cover the fine", body = crate::domain::Error),
        (status = 403, description = "Not the borrower or desk staff", body = crate::domain::Error),
        (status = 404, description = "Unknown copy", body = crate::domain::Error),
        (status = 409, description = "No outstanding loan", body = crate::domain::Error),
        (status = 422, description = "Payment not confirmed", body = crate::domain::Error),
        (status = 503, description = "Payment gateway unavailable", body = crate::domain::Error)
    ),
    tags = ["lending"],
    operation_id = "payFine",
    security(("ForwardedIdentity" = []))
)]
#[post("/copies/{id}/pay-fine")]
pub async fn pay_fine(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
    payload: web::Json<PayFineBody>,
) -> ApiResult<web::Json<PayFineResponseBody>> {
    let copy_id = parse_copy_id(path.into_inner())?;
    let PayFineBody {
        amount,
        payment_reference,
    } = payload.into_inner();
    let claim = PaymentClaim {
        amount: FineAmount::new(amount)
            .map_err(|err| Error::invalid_request(err.to_string()))?,
        reference: PaymentReference::new(payment_reference)
            .map_err(|err| Error::invalid_request(err.to_string()))?,
    };

    let response = state
        .commands
        .pay_fine(PayFineRequest {
            copy_id,
            actor: caller.into_actor(),
            claim,
        })
        .await?;
    Ok(web::Json(PayFineResponseBody {
        returned: true,
        amount_paid: response.amount_paid.get(),
        payment_reference: response.reference.to_string(),
    }))
}

/// Set a copy's administrative status (Active or Deactive).
#[utoipa::path(
    put,
    path = "/api/v1/copies/{id}/status",
    params(("id" = uuid::Uuid, Path, description = "Copy identifier")),
    request_body = SetStatusBody,
    responses(
        (status = 200, description = "Status set", body = SetStatusResponseBody),
        (status = 401, description = "Unauthorized", body = crate::domain::Error),
        (status = 403, description = "Caller may not administer copies", body = crate::domain::Error),
        (status = 404, description = "Unknown copy", body = crate::domain::Error),
        (status = 409, description = "Copy is reserved or issued", body = crate::domain::Error)
    ),
    tags = ["copies"],
    operation_id = "setCopyStatus",
    security(("ForwardedIdentity" = []))
)]
#[put("/copies/{id}/status")]
pub async fn set_copy_status(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
    payload: web::Json<SetStatusBody>,
) -> ApiResult<web::Json<SetStatusResponseBody>> {
    let copy_id = parse_copy_id(path.into_inner())?;
    let response = state
        .commands
        .set_status(SetCopyStatusRequest {
            copy_id,
            actor: caller.into_actor(),
            status: payload.into_inner().status,
        })
        .await?;
    Ok(web::Json(SetStatusResponseBody {
        status: response.status,
    }))
}

#[cfg(test)]
#[path = "copies_tests.rs"]
mod tests;
