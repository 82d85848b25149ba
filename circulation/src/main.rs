//! Service entry-point: loads configuration and starts the HTTP server.

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use circulation::inbound::http::health::HealthState;
use circulation::server::{CirculationSettings, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = CirculationSettings::load()
        .map_err(|e| std::io::Error::other(format!("configuration load failed: {e}")))?;
    let config = ServerConfig::from_settings(&settings)
        .map_err(|e| std::io::Error::other(format!("configuration invalid: {e}")))?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    server.await
}
