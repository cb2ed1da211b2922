use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{PaymentId, ReportId, UserId};
use crate::error::{CoreError, Result};

/// Currency recorded for unlocks that bypass the payment processor.
pub const MOCK_CURRENCY: &str = "demo";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Confirmed by a processor webhook.
    Completed,
    /// Recorded by the demo unlock path.
    Succeeded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "completed",
            PaymentStatus::Succeeded => "succeeded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "completed" => Ok(PaymentStatus::Completed),
            "succeeded" => Ok(PaymentStatus::Succeeded),
            other => Err(CoreError::Validation(format!("unknown payment status: {}", other))),
        }
    }
}

/// A payment that unlocks one report.
///
/// `amount` is in minor currency units. Processor payments are keyed by
/// `stripe_session_id`; mock payments have no session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: Option<UserId>,
    pub report_id: ReportId,
    pub stripe_session_id: Option<String>,
    pub stripe_payment_id: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Payment confirmed by a completed checkout session.
    pub fn from_checkout(
        report_id: ReportId,
        user_id: Option<UserId>,
        session_id: impl Into<String>,
        payment_intent: Option<String>,
        amount: i64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            user_id,
            report_id,
            stripe_session_id: Some(session_id.into()),
            stripe_payment_id: payment_intent,
            amount,
            currency: currency.into(),
            status: PaymentStatus::Completed,
            created_at: Utc::now(),
        }
    }

    /// Zero-amount payment for the demo unlock path.
    pub fn mock(report_id: ReportId, user_id: UserId) -> Self {
        Self {
            id: PaymentId::new(),
            user_id: Some(user_id),
            report_id,
            stripe_session_id: None,
            stripe_payment_id: None,
            amount: 0,
            currency: MOCK_CURRENCY.to_string(),
            status: PaymentStatus::Succeeded,
            created_at: Utc::now(),
        }
    }

    pub fn is_mock(&self) -> bool {
        self.stripe_session_id.is_none()
    }
}

/// Result of recording a payment against a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// The report went from locked to unlocked.
    Unlocked,
    /// The report was already unlocked. Processor payments are still recorded
    /// (once per session); mock payments are rolled back.
    AlreadyUnlocked,
    /// No report with that id; nothing was written.
    ReportNotFound,
}
