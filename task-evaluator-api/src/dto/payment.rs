use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Body of the checkout and mock-unlock endpoints, as JSON or a form.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UnlockRequest {
    #[serde(default, rename = "reportId")]
    pub report_id: Option<String>,
    #[serde(default, rename = "evaluationId")]
    pub evaluation_id: Option<String>,
}

impl UnlockRequest {
    pub fn for_report(report_id: impl Into<String>) -> Self {
        Self {
            report_id: Some(report_id.into()),
            evaluation_id: None,
        }
    }

    /// `evaluationId` wins when both are present.
    pub fn target(&self) -> Option<&str> {
        [self.evaluation_id.as_deref(), self.report_id.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|id| !id.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MockUnlockResponse {
    pub success: bool,
    #[serde(rename = "reportId")]
    pub report_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Envelope of a processor event; `data.object` is decoded per event type.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEventData {
    pub object: Value,
}

/// The parts of a completed checkout session this service records.
#[derive(Debug, Deserialize)]
pub struct CompletedCheckoutSession {
    pub id: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}
