//! Tests for the error payload and its trace capture.

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[fixture]
fn base_error() -> Error {
    Error::invalid_request("bad")
}

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::unauthorized("who"), ErrorCode::Unauthorized)]
#[case(Error::forbidden("no"), ErrorCode::Forbidden)]
#[case(Error::not_found("missing"), ErrorCode::NotFound)]
#[case(Error::conflict("dup"), ErrorCode::Conflict)]
#[case(Error::invalid_transition("held"), ErrorCode::InvalidTransition)]
#[case(Error::payment_required("fine"), ErrorCode::PaymentRequired)]
#[case(Error::payment_not_confirmed("unpaid"), ErrorCode::PaymentNotConfirmed)]
#[case(Error::service_unavailable("down"), ErrorCode::ServiceUnavailable)]
#[case(Error::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_codes(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn try_with_trace_id_rejects_empty_values(base_error: Error) {
    let result = base_error.try_with_trace_id("   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyTraceId)));
}

#[rstest]
fn new_returns_none_when_trace_id_out_of_scope() {
    let error = Error::internal("boom");
    assert!(error.trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope(expected_trace_id: String) {
    let trace_id: TraceId = expected_trace_id
        .parse()
        .expect("fixtures provide a valid UUID");
    let error = TraceId::scope(trace_id, async move {
        Error::try_new(ErrorCode::InternalError, "boom")
            .expect("validation accepts non-empty message")
    })
    .await;

    assert_eq!(error.trace_id(), Some(expected_trace_id.as_str()));
}

#[rstest]
#[tokio::test]
async fn try_from_error_dto_clears_ambient_trace(expected_trace_id: String) {
    let trace_id: TraceId = expected_trace_id
        .parse()
        .expect("fixtures provide a valid UUID");
    let dto = ErrorDto {
        code: ErrorCode::InvalidRequest,
        message: "bad".to_owned(),
        trace_id: None,
        details: None,
    };

    let error = TraceId::scope(trace_id, async move {
        Error::try_from(dto).expect("conversion succeeds for valid payload without trace")
    })
    .await;

    assert!(error.trace_id().is_none());
}

#[rstest]
fn serialisation_skips_absent_optionals(base_error: Error) {
    let value = serde_json::to_value(base_error).expect("serialise error");
    assert_eq!(value.get("code"), Some(&json!("invalid_request")));
    assert!(value.get("traceId").is_none());
    assert!(value.get("details").is_none());
}

#[rstest]
fn serialisation_round_trips_details(expected_trace_id: String) {
    let error = Error::payment_required("fine outstanding")
        .with_trace_id(expected_trace_id.clone())
        .with_details(json!({ "fine": 10 }));

    let value = serde_json::to_value(error.clone()).expect("serialise error");
    assert_eq!(value.get("traceId"), Some(&json!(expected_trace_id)));
    assert_eq!(value.get("details"), Some(&json!({ "fine": 10 })));

    let restored: Error = serde_json::from_value(value).expect("deserialise error");
    assert_eq!(restored, error);
}

#[rstest]
fn codes_serialise_snake_case() {
    let value = serde_json::to_value(ErrorCode::PaymentNotConfirmed).expect("serialise code");
    assert_eq!(value, json!("payment_not_confirmed"));
}
