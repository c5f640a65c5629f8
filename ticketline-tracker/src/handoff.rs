use serde_json::Value;
use std::sync::Arc;
use ticketline_core::credentials::CredentialProvider;
use ticketline_core::navigation::Navigator;
use ticketline_core::payment::{PaymentDataError, PaymentGateway, PaymentGatewayRequest};
use tracing::{error, info, warn};

use crate::state::ErrorInfo;

/// Validate a booking result and derive the gateway request from it.
/// Runs before any network call so incomplete results never reach the gateway.
pub fn prepare_request(payload: &Value) -> Result<PaymentGatewayRequest, PaymentDataError> {
    PaymentGatewayRequest::from_result(payload).map_err(|reason| {
        warn!("Booking result cannot be paid: {}", reason);
        reason
    })
}

/// Turns a confirmed booking into a redirect to the payment gateway
#[derive(Clone)]
pub struct PaymentHandoff {
    gateway: Arc<dyn PaymentGateway>,
    credentials: Arc<dyn CredentialProvider>,
    navigator: Arc<dyn Navigator>,
}

impl PaymentHandoff {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        credentials: Arc<dyn CredentialProvider>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self { gateway, credentials, navigator }
    }

    /// Create the payment and navigate to it. Returns the payment URL.
    /// Never retries: a failure here is final for this booking attempt.
    pub async fn execute(&self, request: &PaymentGatewayRequest) -> Result<String, ErrorInfo> {
        let credentials = self.credentials.credentials();
        info!(
            "Initiating payment for ticket {} (amount {}, customer {})",
            request.ticket_id, request.amount, request.customer_id
        );

        let redirect = self
            .gateway
            .create_payment(request, &credentials)
            .await
            .map_err(|e| {
                error!("Payment initiation failed for ticket {}: {}", request.ticket_id, e);
                ErrorInfo::payment(e.user_message())
            })?;

        self.navigator.navigate(&redirect.payment_url).map_err(|e| {
            error!("Could not open payment page for ticket {}: {}", request.ticket_id, e);
            ErrorInfo::payment(e.to_string())
        })?;

        Ok(redirect.payment_url)
    }
}
