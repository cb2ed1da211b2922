use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use task_evaluator_core::domain::{Payment, ReportId, UnlockOutcome, UserId};

use crate::{
    dto::*,
    error::{ApiError, ApiResult},
    observability::EvaluatorMetrics,
    security::{verify_signature, DEFAULT_TOLERANCE},
    AppState,
};

const SIGNATURE_HEADER: &str = "stripe-signature";
const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// `POST /stripe/webhook`: verifies the signature on the raw body, then
/// records completed checkouts.
///
/// Once the signature checks out the response is always `{received: true}`;
/// processing failures are logged so the processor does not retry them.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let stripe = state
        .payment_settings
        .stripe
        .require("Stripe webhook is not configured")?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            EvaluatorMetrics::webhook_event("rejected");
            ApiError::BadRequest("Missing Stripe signature".to_string())
        })?;

    verify_signature(
        &body,
        signature,
        &stripe.webhook_secret,
        DEFAULT_TOLERANCE,
        Utc::now().timestamp(),
    )
    .map_err(|err| {
        EvaluatorMetrics::webhook_event("rejected");
        tracing::warn!(error = %err, "webhook signature rejected");
        ApiError::BadRequest(format!("Webhook Error: {}", err))
    })?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|err| ApiError::BadRequest(format!("Webhook Error: {}", err)))?;

    if event.event_type == CHECKOUT_COMPLETED {
        let outcome = handle_completed_checkout(&state, event.data.object).await;
        EvaluatorMetrics::webhook_event(outcome);
        tracing::info!(event_id = ?event.id, outcome, "checkout webhook processed");
    } else {
        EvaluatorMetrics::webhook_event("ignored");
        tracing::debug!(event_id = ?event.id, event_type = %event.event_type, "webhook ignored");
    }

    Ok(Json(WebhookAck { received: true }))
}

/// Records the payment and unlocks the report; returns the metric outcome.
async fn handle_completed_checkout(state: &AppState, object: serde_json::Value) -> &'static str {
    let session: CompletedCheckoutSession = match serde_json::from_value(object) {
        Ok(session) => session,
        Err(err) => {
            tracing::error!(error = %err, "malformed checkout session payload");
            return "failed";
        }
    };

    let Some(report_id) = session
        .metadata
        .get("report_id")
        .and_then(|id| id.parse::<ReportId>().ok())
    else {
        tracing::error!(session_id = %session.id, "checkout session without a valid report_id");
        return "failed";
    };

    let user_id = session
        .client_reference_id
        .as_deref()
        .and_then(|id| id.parse::<UserId>().ok());

    let payment = Payment::from_checkout(
        report_id,
        user_id,
        session.id.clone(),
        session.payment_intent,
        session.amount_total.unwrap_or_default(),
        session.currency.unwrap_or_default(),
    );

    match state.payments.record_and_unlock(&payment).await {
        Ok(UnlockOutcome::Unlocked) => {
            EvaluatorMetrics::report_unlocked("webhook");
            tracing::info!(%report_id, session_id = %session.id, "report unlocked");
            "unlocked"
        }
        Ok(UnlockOutcome::AlreadyUnlocked) => {
            tracing::info!(%report_id, session_id = %session.id, "report was already unlocked");
            "duplicate"
        }
        Ok(UnlockOutcome::ReportNotFound) => {
            tracing::error!(%report_id, session_id = %session.id, "paid report does not exist");
            "report_not_found"
        }
        Err(err) => {
            tracing::error!(%report_id, session_id = %session.id, error = %err, "failed to record payment");
            "failed"
        }
    }
}
