//! Server configuration loaded via OrthoConfig.

use std::net::SocketAddr;
use std::time::Duration;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use reqwest::Url;
use serde::Deserialize;

use crate::domain::{FineAmount, FineSchedule};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_PAYMENT_TIMEOUT_SECS: u64 = 10;

/// Configuration values controlling the circulation service.
///
/// All values may come from the environment (prefix `CIRCULATION`), a config
/// file, or command line flags; accessors apply the defaults.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CIRCULATION")]
pub struct CirculationSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// Fine accrued per started overdue day, in whole currency units.
    pub rate_per_day: Option<i64>,
    /// Upper bound on any single fine, in whole currency units.
    pub max_fine: Option<i64>,
    /// Standard loan period in days.
    pub loan_period_days: Option<i64>,
    /// Payment provider confirmation endpoint. When absent the server wires
    /// the always-confirming fixture gateway.
    pub payment_endpoint: Option<String>,
    /// Deadline for one payment confirmation round trip, in seconds.
    pub payment_timeout_secs: Option<u64>,
}

/// Failures turning raw settings into typed configuration.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address: {0}")]
    BindAddr(#[from] std::net::AddrParseError),
    #[error("invalid fine schedule: {0}")]
    FineSchedule(#[from] crate::domain::FineValidationError),
    #[error("invalid payment endpoint: {0}")]
    PaymentEndpoint(#[from] url::ParseError),
}

impl CirculationSettings {
    /// Return the configured bind address, falling back to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        match self.bind_addr {
            Some(addr) => Ok(addr),
            None => Ok(DEFAULT_BIND_ADDR.parse()?),
        }
    }

    /// Build the fine schedule from the configured tariff, falling back to
    /// the standard 2 per day, capped at 1000, over a 14 day loan.
    pub fn fine_schedule(&self) -> Result<FineSchedule, SettingsError> {
        let defaults = FineSchedule::default();
        let rate_per_day = match self.rate_per_day {
            Some(rate) => FineAmount::new(rate)?,
            None => defaults.rate_per_day(),
        };
        let max_fine = match self.max_fine {
            Some(max) => FineAmount::new(max)?,
            None => defaults.max_fine(),
        };
        let loan_period = self
            .loan_period_days
            .map_or(defaults.loan_period(), TimeDelta::days);
        Ok(FineSchedule::new(rate_per_day, max_fine, loan_period)?)
    }

    /// Return the parsed payment endpoint, when one is configured.
    pub fn payment_endpoint(&self) -> Result<Option<Url>, SettingsError> {
        self.payment_endpoint
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(SettingsError::from)
    }

    /// Return the payment confirmation deadline, falling back to ten
    /// seconds.
    pub fn payment_timeout(&self) -> Duration {
        Duration::from_secs(
            self.payment_timeout_secs
                .unwrap_or(DEFAULT_PAYMENT_TIMEOUT_SECS),
        )
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) schedule: FineSchedule,
    pub(crate) payment_endpoint: Option<Url>,
    pub(crate) payment_timeout: Duration,
}

impl ServerConfig {
    /// Construct a server configuration from loaded settings.
    ///
    /// # Errors
    /// Fails when the bind address, tariff, or payment endpoint do not
    /// validate.
    pub fn from_settings(settings: &CirculationSettings) -> Result<Self, SettingsError> {
        Ok(Self {
            bind_addr: settings.bind_addr()?,
            schedule: settings.fine_schedule()?,
            payment_endpoint: settings.payment_endpoint()?,
            payment_timeout: settings.payment_timeout(),
        })
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
