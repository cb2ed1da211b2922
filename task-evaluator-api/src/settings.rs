//! Typed settings for the API layer.
//!
//! External services the handlers talk to are wrapped in [`Integration`], so
//! a handler that needs an absent service reports a misconfiguration instead
//! of looking up environment variables on its own.

use serde::{Deserialize, Deserializer};
use std::time::Duration;
use task_evaluator_core::evaluation::prompt::DEFAULT_MAX_OUTPUT_TOKENS;

use crate::error::ApiError;

/// An external service that may or may not be set up in this deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integration<T> {
    Configured(T),
    Unconfigured,
}

impl<T> Default for Integration<T> {
    fn default() -> Self {
        Integration::Unconfigured
    }
}

impl<T> Integration<T> {
    pub fn settings(&self) -> Option<&T> {
        match self {
            Integration::Configured(settings) => Some(settings),
            Integration::Unconfigured => None,
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Integration::Configured(_))
    }

    /// The settings, or [`ApiError::Misconfigured`] carrying `hint`.
    pub fn require(&self, hint: &str) -> Result<&T, ApiError> {
        self.settings()
            .ok_or_else(|| ApiError::Misconfigured(hint.to_string()))
    }
}

impl<T> From<Option<T>> for Integration<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Integration::Unconfigured, Integration::Configured)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Integration<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Integration::from)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// HS256 secret shared with the auth backend.
    pub jwt_secret: String,
    #[serde(default)]
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    pub api_key: String,
    #[serde(default = "default_model_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_model_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ModelSettings {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: default_model(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            request_timeout_secs: default_model_timeout_secs(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSettings {
    pub secret_key: String,
    pub webhook_secret: String,
    #[serde(default = "default_stripe_api_base")]
    pub api_base: String,
    #[serde(default = "default_stripe_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl StripeSettings {
    pub fn new(
        secret_key: impl Into<String>,
        webhook_secret: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            secret_key: secret_key.into(),
            webhook_secret: webhook_secret.into(),
            api_base: api_base.into(),
            request_timeout_secs: default_stripe_timeout_secs(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentSettings {
    #[serde(default)]
    pub stripe: Integration<StripeSettings>,
    /// Report price in minor currency units; must be positive for checkout.
    #[serde(default)]
    pub price_minor_units: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Origin used for checkout return URLs when the request has no `Origin`.
    #[serde(default = "default_app_url")]
    pub app_url: String,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            stripe: Integration::Unconfigured,
            price_minor_units: 0,
            currency: default_currency(),
            app_url: default_app_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueSettings {
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
    #[serde(default = "default_trigger_timeout_secs")]
    pub trigger_timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_recovery_batch")]
    pub recovery_batch: i64,
}

impl QueueSettings {
    pub fn trigger_timeout(&self) -> Duration {
        Duration::from_secs(self.trigger_timeout_secs)
    }

    /// Delay before retry number `attempt` (1-based), doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1 << exponent))
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
            trigger_timeout_secs: default_trigger_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            recovery_batch: default_recovery_batch(),
        }
    }
}

fn default_model_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_output_tokens() -> u32 {
    DEFAULT_MAX_OUTPUT_TOKENS
}

fn default_model_timeout_secs() -> u64 {
    60
}

fn default_stripe_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_stripe_timeout_secs() -> u64 {
    30
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_queue_capacity() -> usize {
    256
}

fn default_trigger_timeout_secs() -> u64 {
    5
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_recovery_batch() -> i64 {
    500
}
