//! Server construction and middleware wiring.

mod config;

pub use config::{CirculationSettings, ServerConfig, SettingsError};

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetricsBuilder;
use mockable::DefaultClock;
use tracing::warn;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::ports::PaymentGateway;
use crate::domain::{LendingCommandService, LendingQueryService};
use crate::inbound::http::copies::{
    cancel_reservation, get_copy, issue_copy, list_copies, list_copy_activity, pay_fine,
    register_copy, reserve_copy, return_copy, set_copy_status,
};
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::state::HttpState;
use crate::middleware::Trace;
use crate::outbound::payments::{FixturePaymentGateway, HttpPaymentGateway};
use crate::outbound::persistence::{MemoryActivityLog, MemoryCopyStore, MemoryFineLedger};

/// Build the payment gateway from configuration.
///
/// A configured endpoint selects the HTTP adapter with its bounded timeout;
/// otherwise the always-confirming fixture is wired with a startup warning so
/// the service stays runnable in development.
fn build_payment_gateway(config: &ServerConfig) -> std::io::Result<Arc<dyn PaymentGateway>> {
    match &config.payment_endpoint {
        Some(endpoint) => {
            let gateway = HttpPaymentGateway::new(endpoint.clone(), config.payment_timeout)
                .map_err(|err| {
                    std::io::Error::other(format!("payment gateway client construction: {err}"))
                })?;
            Ok(Arc::new(gateway))
        }
        None => {
            warn!("no payment endpoint configured; confirming all fine payments (dev only)");
            Ok(Arc::new(FixturePaymentGateway::default()))
        }
    }
}

/// Assemble the HTTP handler state over in-process adapters.
fn build_http_state(
    config: &ServerConfig,
    payments: Arc<dyn PaymentGateway>,
) -> web::Data<HttpState> {
    let copies = Arc::new(MemoryCopyStore::default());
    let activity = Arc::new(MemoryActivityLog::default());
    let fines = Arc::new(MemoryFineLedger::default());

    let commands = LendingCommandService::new(
        copies.clone(),
        activity.clone(),
        fines,
        payments,
        config.schedule.clone(),
        Arc::new(DefaultClock),
    );
    let queries = LendingQueryService::new(copies, activity);

    web::Data::new(HttpState::new(Arc::new(commands), Arc::new(queries)))
}

/// Compose the application from prepared handler and health state.
///
/// Public so integration tests can drive the exact route table the server
/// runs, substituting their own ports and clock.
pub fn build_app(
    http_state: web::Data<HttpState>,
    health_state: web::Data<HealthState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1")
        .service(register_copy)
        .service(list_copies)
        .service(get_copy)
        .service(list_copy_activity)
        .service(reserve_copy)
        .service(cancel_reservation)
        .service(issue_copy)
        .service(return_copy)
        .service(pay_fine)
        .service(set_copy_status);

    let app = App::new()
        .app_data(http_state)
        .app_data(health_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Build the Prometheus middleware serving `/metrics`.
#[cfg(feature = "metrics")]
fn build_metrics() -> std::io::Result<actix_web_prom::PrometheusMetrics> {
    PrometheusMetricsBuilder::new("circulation")
        .endpoint("/metrics")
        .build()
        .map_err(|err| std::io::Error::other(format!("prometheus metrics setup: {err}")))
}

/// Construct an Actix HTTP server using the provided health state and
/// configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when the payment gateway cannot be built or
/// binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let payments = build_payment_gateway(&config)?;
    let http_state = build_http_state(&config, payments);
    let bind_addr = config.bind_addr;

    #[cfg(feature = "metrics")]
    let metrics = build_metrics()?;

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        let app = build_app(http_state.clone(), server_health_state.clone());
        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics.clone());
        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
