//! Tests for copy lifecycle HTTP handlers.
//!
//! These drive the real lending services over the in-process adapters, with
//! a mutable clock so overdue scenarios are deterministic.

use std::sync::Arc;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use chrono::{DateTime, Utc};
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::domain::{FineSchedule, LendingCommandService, LendingQueryService};
use crate::outbound::payments::FixturePaymentGateway;
use crate::outbound::persistence::{MemoryActivityLog, MemoryCopyStore, MemoryFineLedger};
use crate::test_support::clock::MutableClock;

const STUDENT_ID: &str = "00000000-0000-0000-0000-0000000000a1";
const OTHER_STUDENT_ID: &str = "00000000-0000-0000-0000-0000000000a2";
const STAFF_ID: &str = "00000000-0000-0000-0000-0000000000b1";
const LIBRARIAN_ID: &str = "00000000-0000-0000-0000-0000000000c1";

fn fixture_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
        .expect("RFC3339 fixture timestamp")
        .with_timezone(&Utc)
}

struct TestHarness {
    state: HttpState,
    clock: Arc<MutableClock>,
}

fn harness() -> TestHarness {
    let copies = Arc::new(MemoryCopyStore::default());
    let activity = Arc::new(MemoryActivityLog::default());
    let fines = Arc::new(MemoryFineLedger::default());
    let clock = Arc::new(MutableClock::new(fixture_timestamp()));

    let commands = LendingCommandService::new(
        copies.clone(),
        activity.clone(),
        fines,
        Arc::new(FixturePaymentGateway::default()),
        FineSchedule::default(),
        clock.clone(),
    );
    let queries = LendingQueryService::new(copies, activity);

    TestHarness {
        state: HttpState::new(Arc::new(commands), Arc::new(queries)),
        clock,
    }
}

async fn init_app(
    state: HttpState,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    actix_test::init_service(
        App::new().app_data(web::Data::new(state)).service(
            web::scope("/api/v1")
                .service(register_copy)
                .service(list_copies)
                .service(get_copy)
                .service(list_copy_activity)
                .service(reserve_copy)
                .service(cancel_reservation)
                .service(issue_copy)
                .service(return_copy)
                .service(pay_fine)
                .service(set_copy_status),
        ),
    )
    .await
}

fn identified(req: actix_test::TestRequest, user_id: &str, role: &str) -> actix_test::TestRequest {
    req.insert_header(("X-User-Id", user_id))
        .insert_header(("X-User-Role", role))
}

fn sample_copy_payload() -> Value {
    json!({
        "title": "The Rust Programming Language",
        "author": "Klabnik and Nichols",
        "isbn": "978-1-7185-0310-6",
        "callNumber": "005.133 RUS",
        "accessionNumber": "ACC-0042"
    })
}

async fn register(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
) -> String {
    let req = identified(
        actix_test::TestRequest::post().uri("/api/v1/copies"),
        LIBRARIAN_ID,
        "libstaff",
    )
    .set_json(sample_copy_payload())
    .to_request();
    let res = actix_test::call_service(app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["status"], "Active");
    body["id"].as_str().expect("copy id").to_owned()
}

async fn issue_to(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    copy_id: &str,
    borrower: &str,
) -> Value {
    let req = identified(
        actix_test::TestRequest::post().uri(&format!("/api/v1/copies/{copy_id}/issue")),
        STAFF_ID,
        "staff",
    )
    .set_json(json!({ "userId": borrower }))
    .to_request();
    let res = actix_test::call_service(app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    actix_test::read_body_json(res).await
}

#[actix_web::test]
async fn register_and_get_round_trips_the_catalogue_fields() {
    let TestHarness { state, .. } = harness();
    let app = init_app(state).await;
    let copy_id = register(&app).await;

    let req = identified(
        actix_test::TestRequest::get().uri(&format!("/api/v1/copies/{copy_id}")),
        STUDENT_ID,
        "student",
    )
    .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["accessionNumber"], "ACC-0042");
    assert_eq!(body["status"], "Active");
    assert!(body.get("reservedBy").is_none());
    assert!(body.get("issuedTo").is_none());
}

#[actix_web::test]
async fn register_requires_a_librarian_role() {
    let TestHarness { state, .. } = harness();
    let app = init_app(state).await;

    let req = identified(
        actix_test::TestRequest::post().uri("/api/v1/copies"),
        STUDENT_ID,
        "student",
    )
    .set_json(sample_copy_payload())
    .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn missing_identity_headers_are_unauthorized() {
    let TestHarness { state, .. } = harness();
    let app = init_app(state).await;

    let req = actix_test::TestRequest::get()
        .uri("/api/v1/copies")
        .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn malformed_copy_id_is_a_bad_request() {
    let TestHarness { state, .. } = harness();
    let app = init_app(state).await;

    let req = identified(
        actix_test::TestRequest::post().uri("/api/v1/copies/not-a-uuid/reserve"),
        STUDENT_ID,
        "student",
    )
    .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["details"]["field"], "id");
}

#[actix_web::test]
async fn reserve_is_idempotent_for_the_same_user() {
    let TestHarness { state, .. } = harness();
    let app = init_app(state).await;
    let copy_id = register(&app).await;
    let uri = format!("/api/v1/copies/{copy_id}/reserve");

    let req = identified(actix_test::TestRequest::post().uri(&uri), STUDENT_ID, "student")
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let first: Value = actix_test::read_body_json(res).await;
    assert_eq!(first["status"], "Reserved");
    assert_eq!(first["replayed"], false);

    let req = identified(actix_test::TestRequest::post().uri(&uri), STUDENT_ID, "student")
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let second: Value = actix_test::read_body_json(res).await;
    assert_eq!(second["replayed"], true);
    assert_eq!(second["reservedAt"], first["reservedAt"]);
}

#[actix_web::test]
async fn reserving_anothers_reservation_conflicts() {
    let TestHarness { state, .. } = harness();
    let app = init_app(state).await;
    let copy_id = register(&app).await;
    let uri = format!("/api/v1/copies/{copy_id}/reserve");

    let req = identified(actix_test::TestRequest::post().uri(&uri), STUDENT_ID, "student")
        .to_request();
    assert_eq!(
        actix_test::call_service(&app, req).await.status(),
        StatusCode::OK
    );

    let req = identified(
        actix_test::TestRequest::post().uri(&uri),
        OTHER_STUDENT_ID,
        "student",
    )
    .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_transition");
}

#[actix_web::test]
async fn cancel_returns_the_copy_to_active() {
    let TestHarness { state, .. } = harness();
    let app = init_app(state).await;
    let copy_id = register(&app).await;

    let req = identified(
        actix_test::TestRequest::post().uri(&format!("/api/v1/copies/{copy_id}/reserve")),
        STUDENT_ID,
        "student",
    )
    .to_request();
    assert_eq!(
        actix_test::call_service(&app, req).await.status(),
        StatusCode::OK
    );

    let req = identified(
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/copies/{copy_id}/cancel-reservation")),
        STUDENT_ID,
        "student",
    )
    .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["status"], "Active");

    // No reservation residue on the copy view.
    let req = identified(
        actix_test::TestRequest::get().uri(&format!("/api/v1/copies/{copy_id}")),
        STUDENT_ID,
        "student",
    )
    .to_request();
    let res = actix_test::call_service(&app, req).await;
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["status"], "Active");
    assert!(body.get("reservedBy").is_none());
    assert!(body.get("reservedAt").is_none());
}

#[actix_web::test]
async fn issue_requires_a_desk_role() {
    let TestHarness { state, .. } = harness();
    let app = init_app(state).await;
    let copy_id = register(&app).await;

    let req = identified(
        actix_test::TestRequest::post().uri(&format!("/api/v1/copies/{copy_id}/issue")),
        STUDENT_ID,
        "student",
    )
    .set_json(json!({ "userId": STUDENT_ID }))
    .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn issue_honours_anothers_reservation() {
    let TestHarness { state, .. } = harness();
    let app = init_app(state).await;
    let copy_id = register(&app).await;

    let req = identified(
        actix_test::TestRequest::post().uri(&format!("/api/v1/copies/{copy_id}/reserve")),
        STUDENT_ID,
        "student",
    )
    .to_request();
    assert_eq!(
        actix_test::call_service(&app, req).await.status(),
        StatusCode::OK
    );

    let req = identified(
        actix_test::TestRequest::post().uri(&format!("/api/v1/copies/{copy_id}/issue")),
        STAFF_ID,
        "staff",
    )
    .set_json(json!({ "userId": OTHER_STUDENT_ID }))
    .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn on_time_return_finalises_immediately() {
    let TestHarness { state, clock } = harness();
    let app = init_app(state).await;
    let copy_id = register(&app).await;
    issue_to(&app, &copy_id, STUDENT_ID).await;

    // One day before the 14-day due date.
    clock.advance_days(13);
    let req = identified(
        actix_test::TestRequest::post().uri(&format!("/api/v1/copies/{copy_id}/return")),
        STUDENT_ID,
        "student",
    )
    .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["returned"], true);
    assert!(body.get("requiresPayment").is_none());
    assert!(body.get("fine").is_none());
}

#[actix_web::test]
async fn overdue_return_requires_payment_then_pay_fine_finalises() {
    let TestHarness { state, clock } = harness();
    let app = init_app(state).await;
    let copy_id = register(&app).await;
    issue_to(&app, &copy_id, STUDENT_ID).await;

    // Five days past the 14-day due date at 2 per day.
    clock.advance_days(19);
    let return_uri = format!("/api/v1/copies/{copy_id}/return");
    let req = identified(
        actix_test::TestRequest::post().uri(&return_uri),
        STUDENT_ID,
        "student",
    )
    .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["returned"], false);
    assert_eq!(body["requiresPayment"], true);
    assert_eq!(body["fine"], 10);

    // The copy stays issued until the fine is settled.
    let req = identified(
        actix_test::TestRequest::get().uri(&format!("/api/v1/copies/{copy_id}")),
        STUDENT_ID,
        "student",
    )
    .to_request();
    let res = actix_test::call_service(&app, req).await;
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["status"], "Issued");

    let req = identified(
        actix_test::TestRequest::post().uri(&format!("/api/v1/copies/{copy_id}/pay-fine")),
        STUDENT_ID,
        "student",
    )
    .set_json(json!({ "amount": 10, "paymentReference": "txn-314" }))
    .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["returned"], true);
    assert_eq!(body["amountPaid"], 10);
    assert_eq!(body["paymentReference"], "txn-314");

    let req = identified(
        actix_test::TestRequest::get().uri(&format!("/api/v1/copies/{copy_id}")),
        STUDENT_ID,
        "student",
    )
    .to_request();
    let res = actix_test::call_service(&app, req).await;
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["status"], "Active");
}

#[actix_web::test]
async fn underpaying_an_overdue_fine_is_payment_required() {
    let TestHarness { state, clock } = harness();
    let app = init_app(state).await;
    let copy_id = register(&app).await;
    issue_to(&app, &copy_id, STUDENT_ID).await;
    clock.advance_days(19);

    let req = identified(
        actix_test::TestRequest::post().uri(&format!("/api/v1/copies/{copy_id}/pay-fine")),
        STUDENT_ID,
        "student",
    )
    .set_json(json!({ "amount": 4, "paymentReference": "txn-short" }))
    .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::PAYMENT_REQUIRED);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "payment_required");
    assert_eq!(body["details"]["fine"], 10);
}

#[actix_web::test]
async fn activity_lists_the_lifecycle_newest_first() {
    let TestHarness { state, clock } = harness();
    let app = init_app(state).await;
    let copy_id = register(&app).await;
    issue_to(&app, &copy_id, STUDENT_ID).await;
    clock.advance_days(19);

    let req = identified(
        actix_test::TestRequest::post().uri(&format!("/api/v1/copies/{copy_id}/pay-fine")),
        STUDENT_ID,
        "student",
    )
    .set_json(json!({ "amount": 10, "paymentReference": "txn-trail" }))
    .to_request();
    assert_eq!(
        actix_test::call_service(&app, req).await.status(),
        StatusCode::OK
    );

    let req = identified(
        actix_test::TestRequest::get().uri(&format!("/api/v1/copies/{copy_id}/activity")),
        STAFF_ID,
        "staff",
    )
    .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;

    let kinds: Vec<&str> = body["events"]
        .as_array()
        .expect("events array")
        .iter()
        .map(|event| event["type"].as_str().expect("event type"))
        .collect();
    assert_eq!(kinds, vec!["return", "finePayment", "issue"]);

    let fine_payment = &body["events"][1];
    assert_eq!(fine_payment["fineAmount"], 10);
    assert_eq!(fine_payment["userId"], STUDENT_ID);
}

#[rstest]
#[case::deactivate("Deactive", "Deactive")]
#[case::reactivate("Active", "Active")]
#[actix_web::test]
async fn librarians_toggle_administrative_status(
    #[case] target: &str,
    #[case] expected: &str,
) {
    let TestHarness { state, .. } = harness();
    let app = init_app(state).await;
    let copy_id = register(&app).await;

    let req = identified(
        actix_test::TestRequest::put().uri(&format!("/api/v1/copies/{copy_id}/status")),
        LIBRARIAN_ID,
        "admin",
    )
    .set_json(json!({ "status": target }))
    .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["status"], expected);
}

#[actix_web::test]
async fn status_toggle_rejects_an_issued_copy() {
    let TestHarness { state, .. } = harness();
    let app = init_app(state).await;
    let copy_id = register(&app).await;
    issue_to(&app, &copy_id, STUDENT_ID).await;

    let req = identified(
        actix_test::TestRequest::put().uri(&format!("/api/v1/copies/{copy_id}/status")),
        LIBRARIAN_ID,
        "admin",
    )
    .set_json(json!({ "status": "Deactive" }))
    .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn listing_respects_page_bounds() {
    let TestHarness { state, .. } = harness();
    let app = init_app(state).await;
    register(&app).await;

    let req = identified(
        actix_test::TestRequest::get().uri("/api/v1/copies?limit=500"),
        STAFF_ID,
        "staff",
    )
    .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let req = identified(
        actix_test::TestRequest::get().uri("/api/v1/copies?limit=10&offset=0"),
        STAFF_ID,
        "staff",
    )
    .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["copies"].as_array().map(Vec::len), Some(1));
}
