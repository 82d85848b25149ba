//! End-to-end lending lifecycle over the assembled application.
//!
//! These tests exercise the exact route table the server runs, wired over
//! the in-process adapters with a mutable clock so overdue fines are
//! deterministic.

use std::sync::{Arc, Mutex};

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test as actix_test, web};
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use serde_json::{Value, json};

use circulation::domain::{FineSchedule, LendingCommandService, LendingQueryService};
use circulation::inbound::http::health::HealthState;
use circulation::inbound::http::state::HttpState;
use circulation::outbound::payments::FixturePaymentGateway;
use circulation::outbound::persistence::{MemoryActivityLog, MemoryCopyStore, MemoryFineLedger};
use circulation::server::build_app;

const STUDENT_ID: &str = "00000000-0000-0000-0000-0000000000a1";
const OTHER_STUDENT_ID: &str = "00000000-0000-0000-0000-0000000000a2";
const STAFF_ID: &str = "00000000-0000-0000-0000-0000000000b1";
const LIBRARIAN_ID: &str = "00000000-0000-0000-0000-0000000000c1";

/// Clock whose current instant is set by the test and advanced manually.
struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    fn advance_days(&self, days: i64) {
        match self.0.lock() {
            Ok(mut guard) => *guard += TimeDelta::days(days),
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        match self.0.lock() {
            Ok(guard) => *guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

fn fixture_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
        .expect("RFC3339 fixture timestamp")
        .with_timezone(&Utc)
}

struct Harness {
    http_state: web::Data<HttpState>,
    health_state: web::Data<HealthState>,
    clock: Arc<MutableClock>,
}

fn harness() -> Harness {
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

    Harness {
        http_state: web::Data::new(HttpState::new(Arc::new(commands), Arc::new(queries))),
        health_state: web::Data::new(HealthState::new()),
        clock,
    }
}

async fn init(
    harness: &Harness,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    actix_test::init_service(build_app(
        harness.http_state.clone(),
        harness.health_state.clone(),
    ))
    .await
}

fn identified(req: actix_test::TestRequest, user_id: &str, role: &str) -> actix_test::TestRequest {
    req.insert_header(("X-User-Id", user_id))
        .insert_header(("X-User-Role", role))
}

async fn register_copy(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
) -> String {
    let req = identified(
        actix_test::TestRequest::post().uri("/api/v1/copies"),
        LIBRARIAN_ID,
        "libstaff",
    )
    .set_json(json!({
        "title": "Programming Rust",
        "author": "Blandy, Orendorff, and Tindall",
        "isbn": "978-1-4920-5259-3",
        "callNumber": "005.133 PRO",
        "accessionNumber": "ACC-0101"
    }))
    .to_request();
    let res = actix_test::call_service(app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(res).await;
    body["id"].as_str().expect("copy id").to_owned()
}

async fn post_transition(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    copy_id: &str,
    action: &str,
    user_id: &str,
    role: &str,
    payload: Option<Value>,
) -> ServiceResponse {
    let mut req = identified(
        actix_test::TestRequest::post().uri(&format!("/api/v1/copies/{copy_id}/{action}")),
        user_id,
        role,
    );
    if let Some(body) = payload {
        req = req.set_json(body);
    }
    actix_test::call_service(app, req.to_request()).await
}

async fn copy_status(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    copy_id: &str,
) -> String {
    let req = identified(
        actix_test::TestRequest::get().uri(&format!("/api/v1/copies/{copy_id}")),
        STAFF_ID,
        "staff",
    )
    .to_request();
    let res = actix_test::call_service(app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    body["status"].as_str().expect("status field").to_owned()
}

#[actix_web::test]
async fn overdue_lifecycle_settles_fine_and_releases_the_copy() {
    let harness = harness();
    let app = init(&harness).await;
    let copy_id = register_copy(&app).await;

    let res = post_transition(&app, &copy_id, "reserve", STUDENT_ID, "student", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["status"], "Reserved");

    let res = post_transition(
        &app,
        &copy_id,
        "issue",
        STAFF_ID,
        "staff",
        Some(json!({ "userId": STUDENT_ID })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["status"], "Issued");

    // Fourteen-day loan, returned five days late: fine is 5 * 2 = 10.
    harness.clock.advance_days(19);

    let res = post_transition(&app, &copy_id, "return", STAFF_ID, "staff", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["returned"], false);
    assert_eq!(body["requiresPayment"], true);
    assert_eq!(body["fine"], 10);
    assert_eq!(copy_status(&app, &copy_id).await, "Issued");

    let res = post_transition(
        &app,
        &copy_id,
        "pay-fine",
        STUDENT_ID,
        "student",
        Some(json!({ "amount": 10, "paymentReference": "txn-e2e-1" })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["returned"], true);
    assert_eq!(body["amountPaid"], 10);
    assert_eq!(copy_status(&app, &copy_id).await, "Active");

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
    assert_eq!(kinds, vec!["return", "finePayment", "issue", "reserve"]);
}

#[actix_web::test]
async fn on_time_return_releases_the_copy_without_payment() {
    let harness = harness();
    let app = init(&harness).await;
    let copy_id = register_copy(&app).await;

    let res = post_transition(
        &app,
        &copy_id,
        "issue",
        STAFF_ID,
        "staff",
        Some(json!({ "userId": STUDENT_ID })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    harness.clock.advance_days(13);

    let res = post_transition(&app, &copy_id, "return", STAFF_ID, "staff", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["returned"], true);
    assert_eq!(copy_status(&app, &copy_id).await, "Active");
}

#[actix_web::test]
async fn concurrent_reservations_admit_exactly_one_caller() {
    let harness = harness();
    let app = init(&harness).await;
    let copy_id = register_copy(&app).await;

    let first = post_transition(&app, &copy_id, "reserve", STUDENT_ID, "student", None);
    let second = post_transition(&app, &copy_id, "reserve", OTHER_STUDENT_ID, "student", None);
    let (first, second) = futures::join!(first, second);

    let mut statuses = [first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);
    assert_eq!(copy_status(&app, &copy_id).await, "Reserved");
}

#[actix_web::test]
async fn responses_carry_a_trace_id_header() {
    let harness = harness();
    let app = init(&harness).await;

    let req = identified(
        actix_test::TestRequest::get().uri("/api/v1/copies"),
        STAFF_ID,
        "staff",
    )
    .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("Trace-Id"));
}

#[actix_web::test]
async fn readiness_flips_with_the_health_flag() {
    let harness = harness();
    let app = init(&harness).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/health/ready")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    harness.health_state.mark_ready();
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/health/ready")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}
