//! Payment processor collaborator: hosted checkout sessions going out,
//! signed webhook events coming back. The purchase id travels through
//! the session metadata and is the only link the webhook needs.

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::round2;

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub purchase_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub product_name: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted payment page the customer is redirected to.
    pub url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, ApiError>;
}

pub struct HttpPaymentGateway {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self { http: reqwest::Client::new(), base_url, api_key }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, ApiError> {
        // The processor wants amounts in minor units.
        let unit_amount = (round2(request.amount) * 100.0).round() as i64;
        let form = [
            ("mode", "payment".to_string()),
            ("success_url", request.success_url),
            ("cancel_url", request.cancel_url),
            ("line_items[0][quantity]", "1".to_string()),
            ("line_items[0][price_data][currency]", request.currency),
            ("line_items[0][price_data][unit_amount]", unit_amount.to_string()),
            (
                "line_items[0][price_data][product_data][name]",
                request.product_name,
            ),
            ("metadata[purchase_id]", request.purchase_id.to_string()),
        ];

        let res = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .bearer_auth(&self.api_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| ApiError::Dependency(format!("payment processor unreachable: {e}")))?;
        if !res.status().is_success() {
            return Err(ApiError::Dependency(format!(
                "checkout session creation failed: {}",
                res.status()
            )));
        }
        res.json()
            .await
            .map_err(|e| ApiError::Dependency(format!("bad payment processor response: {e}")))
    }
}

// ---- inbound events ----

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventKind {
    Succeeded,
    Failed,
    /// Forward-compatible: kinds we do not know are carried through and
    /// ignored by the state machine, not treated as errors.
    Other(String),
}

#[derive(Debug, Clone)]
pub struct PaymentEvent {
    pub kind: PaymentEventKind,
    pub purchase_id: Option<Uuid>,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: RawEventData,
}

#[derive(Deserialize, Default)]
struct RawEventData {
    #[serde(default)]
    object: RawEventObject,
}

#[derive(Deserialize, Default)]
struct RawEventObject {
    #[serde(default)]
    metadata: std::collections::HashMap<String, String>,
}

/// Parses a verified webhook body into a `PaymentEvent`. Fails only on
/// undecodable JSON; unknown event kinds parse fine as `Other`.
pub fn parse_event(payload: &[u8]) -> Result<PaymentEvent, ApiError> {
    let raw: RawEvent = serde_json::from_slice(payload)
        .map_err(|e| ApiError::Validation(format!("undecodable webhook payload: {e}")))?;

    let kind = match raw.kind.as_str() {
        "checkout.session.completed" => PaymentEventKind::Succeeded,
        "checkout.session.expired" | "payment_intent.payment_failed" => PaymentEventKind::Failed,
        other => PaymentEventKind::Other(other.to_string()),
    };
    let purchase_id = raw
        .data
        .object
        .metadata
        .get("purchase_id")
        .and_then(|s| Uuid::parse_str(s).ok());

    Ok(PaymentEvent { kind, purchase_id })
}
