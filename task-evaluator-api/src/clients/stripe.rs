use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use task_evaluator_core::domain::{ReportId, UserId};
use thiserror::Error;

use crate::settings::StripeSettings;

pub const PRODUCT_NAME: &str = "Smart Task Evaluator – Full Report Unlock";
pub const PRODUCT_DESCRIPTION: &str = "Unlock complete AI insights for one submission.";

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("checkout request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("payment API returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("checkout session has no redirect URL")]
    MissingUrl,
}

/// Everything needed to open a hosted checkout for one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub report_id: ReportId,
    pub user_id: UserId,
    pub customer_email: Option<String>,
    pub unit_amount: i64,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutSessionRequest {
    /// Form fields in the processor's bracketed encoding.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("client_reference_id".to_string(), self.user_id.to_string()),
            ("metadata[report_id]".to_string(), self.report_id.to_string()),
            ("metadata[user_id]".to_string(), self.user_id.to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                self.currency.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                self.unit_amount.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                PRODUCT_NAME.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][description]".to_string(),
                PRODUCT_DESCRIPTION.to_string(),
            ),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];
        if let Some(email) = &self.customer_email {
            fields.push(("customer_email".to_string(), email.clone()));
        }
        fields
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, CheckoutError>;
}

#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    api_base: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(settings: &StripeSettings) -> Result<Self, CheckoutError> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;

        Ok(Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            secret_key: settings.secret_key.clone(),
        })
    }
}

#[async_trait]
impl CheckoutGateway for StripeClient {
    #[tracing::instrument(skip_all, fields(report_id = %request.report_id))]
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, CheckoutError> {
        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .form(&request.form_fields())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CheckoutError::Status { status, body });
        }

        let session = response.json::<CheckoutSession>().await?;
        if session.url.is_none() {
            return Err(CheckoutError::MissingUrl);
        }
        tracing::info!(session_id = %session.id, "checkout session created");
        Ok(session)
    }
}
