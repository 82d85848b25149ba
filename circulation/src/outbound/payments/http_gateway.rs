//! Reqwest-backed payment gateway adapter.
//!
//! This adapter owns transport details only: request serialisation, timeout
//! and HTTP error mapping, and JSON decoding into a domain confirmation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::domain::ports::{
    ConfirmPaymentRequest, PaymentConfirmation, PaymentGateway, PaymentGatewayError,
};

/// Payment gateway adapter that performs HTTP POST requests against one
/// provider endpoint.
pub struct HttpPaymentGateway {
    client: Client,
    endpoint: Url,
}

impl HttpPaymentGateway {
    /// Build an adapter using a reqwest client with an explicit request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn confirm(
        &self,
        request: &ConfirmPaymentRequest,
    ) -> Result<PaymentConfirmation, PaymentGatewayError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        parse_confirmation(body.as_ref(), request)
    }
}

fn parse_confirmation(
    body: &[u8],
    request: &ConfirmPaymentRequest,
) -> Result<PaymentConfirmation, PaymentGatewayError> {
    let confirmation: PaymentConfirmation = serde_json::from_slice(body).map_err(|error| {
        PaymentGatewayError::invalid_response(format!("invalid confirmation payload: {error}"))
    })?;
    if confirmation.amount != request.amount {
        return Err(PaymentGatewayError::invalid_response(format!(
            "confirmation covers {} but {} was requested",
            confirmation.amount, request.amount
        )));
    }
    Ok(confirmation)
}

fn map_transport_error(error: reqwest::Error) -> PaymentGatewayError {
    if error.is_timeout() {
        PaymentGatewayError::Timeout
    } else {
        PaymentGatewayError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> PaymentGatewayError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => PaymentGatewayError::Timeout,
        _ if status.is_client_error() => PaymentGatewayError::declined(message),
        _ => PaymentGatewayError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
