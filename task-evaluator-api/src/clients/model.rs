use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use task_evaluator_core::evaluation::EvaluationPrompt;
use thiserror::Error;

use crate::settings::ModelSettings;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model API returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Anything that can turn a prompt into an opaque completion object.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, prompt: &EvaluationPrompt) -> Result<Value, ModelError>;
}

/// Client for a Responses-style endpoint (`POST {base_url}/responses`).
#[derive(Debug, Clone)]
pub struct ResponsesClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ResponsesClient {
    pub fn new(settings: &ModelSettings) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl ModelClient for ResponsesClient {
    #[tracing::instrument(skip_all, fields(model = %prompt.model))]
    async fn complete(&self, prompt: &EvaluationPrompt) -> Result<Value, ModelError> {
        let response = self
            .client
            .post(format!("{}/responses", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(prompt)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "model API rejected the request");
            return Err(ModelError::Status { status, body });
        }

        Ok(response.json::<Value>().await?)
    }
}
