//! Always-confirming payment gateway for local wiring.
//!
//! This adapter implements the `PaymentGateway` port without a provider
//! behind it: every claim is confirmed immediately, echoing the submitted
//! reference and amount. It keeps the application runnable when no provider
//! endpoint is configured; deployments settle real money through
//! [`HttpPaymentGateway`](super::HttpPaymentGateway).

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::ports::{
    ConfirmPaymentRequest, PaymentConfirmation, PaymentGateway, PaymentGatewayError,
};

/// Gateway stand-in that confirms every payment claim.
#[derive(Debug, Clone, Default)]
pub struct FixturePaymentGateway;

impl FixturePaymentGateway {
    /// Create a new fixture gateway.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentGateway for FixturePaymentGateway {
    async fn confirm(
        &self,
        request: &ConfirmPaymentRequest,
    ) -> Result<PaymentConfirmation, PaymentGatewayError> {
        Ok(PaymentConfirmation {
            reference: request.reference.clone(),
            amount: request.amount,
            confirmed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use uuid::Uuid;

    use super::*;
    use crate::domain::{CopyId, FineAmount, PaymentReference, UserId};

    #[rstest]
    #[tokio::test]
    async fn echoes_the_submitted_claim() {
        let gateway = FixturePaymentGateway::new();
        let request = ConfirmPaymentRequest {
            copy_id: CopyId::from(Uuid::nil()),
            user_id: UserId::random(),
            amount: FineAmount::new(12).expect("valid amount"),
            reference: PaymentReference::new("txn-echo").expect("valid reference"),
        };

        let confirmation = gateway.confirm(&request).await.expect("always confirms");

        assert_eq!(confirmation.reference, request.reference);
        assert_eq!(confirmation.amount, request.amount);
    }
}
