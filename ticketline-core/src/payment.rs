use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::credentials::Credentials;
use crate::message::ticket_id_of;
use crate::nullable::{NullInt32, NullString};

pub const PAYMENT_LANGUAGE: &str = "vn";
pub const MISSING_REDIRECT_MESSAGE: &str = "Không tạo được URL thanh toán từ server.";
pub const PAYMENT_FALLBACK_MESSAGE: &str = "Lỗi trong quá trình tạo yêu cầu thanh toán.";

/// Body of `POST /api/v1/vnpay/create-payment`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentGatewayRequest {
    pub amount: Number,
    pub bank_code: String,
    pub language: String,
    pub ticket_id: String,
    pub notes: String,
    pub customer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentDataError {
    #[error("result has no ticket_id")]
    MissingTicketId,
    #[error("result has no numeric price")]
    MissingPrice,
    #[error("result has neither a valid customer_id nor a phone number")]
    MissingCustomer,
}

impl PaymentGatewayRequest {
    /// Derive the gateway request from a booking result payload.
    /// Nothing is sent when a required field is missing.
    pub fn from_result(payload: &Value) -> Result<Self, PaymentDataError> {
        let ticket_id = ticket_id_of(payload).ok_or(PaymentDataError::MissingTicketId)?;
        let amount = match payload.get("price") {
            Some(Value::Number(n)) => n.clone(),
            _ => return Err(PaymentDataError::MissingPrice),
        };
        let customer_id = resolve_customer_id(payload.get("customer_id"), payload.get("phone"))
            .ok_or(PaymentDataError::MissingCustomer)?;

        Ok(Self {
            amount,
            bank_code: String::new(), // gateway picks the bank
            language: PAYMENT_LANGUAGE.to_string(),
            notes: format!("Thanh toán vé {}", ticket_id),
            ticket_id,
            customer_id,
        })
    }
}

/// Account-linked bookings pay as the customer id; guest bookings as the phone number.
pub fn resolve_customer_id(customer_id: Option<&Value>, phone: Option<&Value>) -> Option<String> {
    let account = customer_id
        .and_then(|v| serde_json::from_value::<NullInt32>(v.clone()).ok())
        .and_then(|id| id.get())
        .filter(|id| *id > 0);
    if let Some(id) = account {
        return Some(id.to_string());
    }

    let phone = match phone? {
        Value::String(s) => s.clone(),
        other => serde_json::from_value::<NullString>(other.clone()).ok()?.string,
    };
    (!phone.is_empty()).then_some(phone)
}

/// Where the gateway wants the customer sent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentRedirect {
    pub payment_url: String,
    #[serde(default)]
    pub txn_ref: Option<String>,
    #[serde(default)]
    pub invoice_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Request failed with status code {status}")]
    Rejected { status: u16, server_message: Option<String> },
    #[error("{0}")]
    Transport(String),
    #[error("{}", MISSING_REDIRECT_MESSAGE)]
    MissingRedirect,
}

impl GatewayError {
    /// Most specific text available: server message, then the error itself, then a fallback
    pub fn user_message(&self) -> String {
        if let GatewayError::Rejected { server_message: Some(msg), .. } = self {
            if !msg.is_empty() {
                return msg.clone();
            }
        }
        let own = self.to_string();
        if own.is_empty() {
            PAYMENT_FALLBACK_MESSAGE.to_string()
        } else {
            own
        }
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Ask the gateway for a payment page for this ticket
    async fn create_payment(
        &self,
        request: &PaymentGatewayRequest,
        credentials: &Credentials,
    ) -> Result<PaymentRedirect, GatewayError>;
}
