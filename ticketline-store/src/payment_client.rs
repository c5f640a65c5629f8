use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use ticketline_core::credentials::Credentials;
use ticketline_core::join_url;
use ticketline_core::payment::{GatewayError, PaymentGateway, PaymentGatewayRequest, PaymentRedirect};
use tracing::{info, warn};

use crate::error::StoreResult;

pub const CREATE_PAYMENT_PATH: &str = "/api/v1/vnpay/create-payment";
pub const REFRESH_TOKEN_HEADER: &str = "X-Refresh-Token";

/// VNPay create-payment endpoint of the payment service.
///
/// The service answers with its standard envelope:
/// `{"success": true, "message": "...", "data": {"payment_url": "...", "txn_ref": "...", "invoice_id": "..."}}`.
#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPaymentGateway {
    pub fn new(api_origin: &str, timeout: Duration) -> StoreResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: join_url(api_origin, CREATE_PAYMENT_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn text_at<'a>(body: &'a Value, pointer: &str) -> Option<&'a str> {
    body.pointer(pointer).and_then(Value::as_str).filter(|s| !s.is_empty())
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_payment(
        &self,
        request: &PaymentGatewayRequest,
        credentials: &Credentials,
    ) -> Result<PaymentRedirect, GatewayError> {
        let mut builder = self.client.post(&self.endpoint).json(request);
        match &credentials.access_token {
            Some(token) => builder = builder.bearer_auth(token),
            None => warn!("No access token found; creating payment for ticket {} unauthenticated", request.ticket_id),
        }
        if let Some(refresh) = &credentials.refresh_token {
            builder = builder.header(REFRESH_TOKEN_HEADER, refresh);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = response.status();
        let body: Value = response
            .text()
            .await
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or(Value::Null);

        if !status.is_success() {
            let server_message = text_at(&body, "/message").map(str::to_string);
            warn!("Payment gateway rejected ticket {} with {}: {:?}", request.ticket_id, status, server_message);
            return Err(GatewayError::Rejected { status: status.as_u16(), server_message });
        }

        let payment_url = text_at(&body, "/data/payment_url").ok_or(GatewayError::MissingRedirect)?;
        info!("Payment URL created for ticket {}", request.ticket_id);

        Ok(PaymentRedirect {
            payment_url: payment_url.to_string(),
            txn_ref: text_at(&body, "/data/txn_ref").map(str::to_string),
            invoice_id: text_at(&body, "/data/invoice_id").map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Seen {
        calls: Arc<Mutex<Vec<(Option<String>, Option<String>, Value)>>>,
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    fn sample_request() -> PaymentGatewayRequest {
        PaymentGatewayRequest::from_result(&json!({
            "ticket_id": "T1",
            "price": 150000,
            "customer_id": {"Valid": true, "Int32": 7},
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_payment_success() {
        let seen = Seen::default();
        let router = Router::new()
            .route(
                CREATE_PAYMENT_PATH,
                post(|State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
                    seen.calls.lock().unwrap().push((header("authorization"), header("x-refresh-token"), body));
                    Json(json!({
                        "success": true,
                        "message": "VNPay payment URL created successfully",
                        "data": {"payment_url": "https://pay.example/x", "txn_ref": "123"}
                    }))
                }),
            )
            .with_state(seen.clone());
        let origin = serve(router).await;

        let gateway = HttpPaymentGateway::new(&origin, Duration::from_secs(5)).unwrap();
        let creds = Credentials { access_token: Some("tok".into()), refresh_token: Some("ref".into()) };
        let redirect = gateway.create_payment(&sample_request(), &creds).await.unwrap();

        assert_eq!(redirect.payment_url, "https://pay.example/x");
        assert_eq!(redirect.txn_ref.as_deref(), Some("123"));
        assert_eq!(redirect.invoice_id, None);

        let calls = seen.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.as_deref(), Some("Bearer tok"));
        assert_eq!(calls[0].1.as_deref(), Some("ref"));
        assert_eq!(calls[0].2["customer_id"], "7");
        assert_eq!(calls[0].2["amount"], 150000);
    }

    #[tokio::test]
    async fn test_rejection_carries_server_message() {
        let router = Router::new().route(
            CREATE_PAYMENT_PATH,
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"success": false, "message": "Failed to create VNPay payment"})),
                )
            }),
        );
        let origin = serve(router).await;
        let gateway = HttpPaymentGateway::new(&origin, Duration::from_secs(5)).unwrap();

        let err = gateway.create_payment(&sample_request(), &Credentials::default()).await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Rejected { status: 500, server_message: Some("Failed to create VNPay payment".into()) }
        );
        assert_eq!(err.user_message(), "Failed to create VNPay payment");
    }

    #[tokio::test]
    async fn test_success_without_url_is_an_error() {
        let router = Router::new().route(
            CREATE_PAYMENT_PATH,
            post(|| async { Json(json!({"success": true, "data": {}})) }),
        );
        let origin = serve(router).await;
        let gateway = HttpPaymentGateway::new(&origin, Duration::from_secs(5)).unwrap();

        let err = gateway.create_payment(&sample_request(), &Credentials::default()).await.unwrap_err();
        assert_eq!(err, GatewayError::MissingRedirect);
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_transport_error() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let origin = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let gateway = HttpPaymentGateway::new(&origin, Duration::from_secs(2)).unwrap();
        let err = gateway.create_payment(&sample_request(), &Credentials::default()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
        assert!(!err.user_message().is_empty());
    }
}
