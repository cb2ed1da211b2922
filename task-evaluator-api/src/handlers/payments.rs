use axum::{
    extract::{FromRequest, Request, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use task_evaluator_core::domain::{Payment, Report, ReportId, UnlockOutcome};

use crate::{
    clients::CheckoutSessionRequest,
    dto::*,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    observability::EvaluatorMetrics,
    AppState,
};

/// `POST /payments/checkout`: opens a hosted checkout for a locked report.
///
/// JSON callers get `{url}`; form posts are redirected straight to it.
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    request: Request,
) -> ApiResult<Response> {
    let gateway = state
        .checkout
        .require("Stripe is not configured. Set payments.stripe.secret_key.")?;
    let settings = &state.payment_settings;
    if settings.price_minor_units <= 0 {
        return Err(ApiError::Misconfigured(
            "Set payments.price_minor_units to a positive integer.".to_string(),
        ));
    }

    let origin = request_origin(request.headers(), &settings.app_url);
    let (body, wants_json) = read_unlock_request(request).await?;
    let report = locked_report_for(&state, &user, &body).await?;

    let return_url = |outcome: &str| format!("{}/reports/{}?checkout={}", origin, report.id, outcome);
    let session_request = CheckoutSessionRequest {
        report_id: report.id,
        user_id: user.user_id,
        customer_email: user.email.clone(),
        unit_amount: settings.price_minor_units,
        currency: settings.currency.clone(),
        success_url: return_url("success"),
        cancel_url: return_url("cancelled"),
    };

    let session = gateway
        .create_session(&session_request)
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    let url = session
        .url
        .ok_or_else(|| ApiError::Upstream("checkout session has no redirect URL".to_string()))?;

    tracing::info!(report_id = %report.id, session_id = %session.id, "checkout started");
    if wants_json {
        Ok(Json(CheckoutResponse { url }).into_response())
    } else {
        Ok(Redirect::to(&url).into_response())
    }
}

/// `POST /payments/mock`: unlocks a report without charging, for demos.
pub async fn mock_unlock(
    State(state): State<AppState>,
    user: AuthUser,
    request: Request,
) -> ApiResult<Json<MockUnlockResponse>> {
    let (body, _) = read_unlock_request(request).await?;
    let report = locked_report_for(&state, &user, &body).await?;

    let payment = Payment::mock(report.id, user.user_id);
    match state.payments.record_and_unlock(&payment).await? {
        UnlockOutcome::Unlocked => {
            EvaluatorMetrics::report_unlocked("mock");
            tracing::info!(report_id = %report.id, "report unlocked by mock payment");
            Ok(Json(MockUnlockResponse {
                success: true,
                report_id: report.id.0,
            }))
        }
        // Lost a race with another unlock between the check and the write.
        UnlockOutcome::AlreadyUnlocked => Err(already_unlocked()),
        UnlockOutcome::ReportNotFound => Err(ApiError::NotFound("Report not found".to_string())),
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

fn request_origin(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty() && *value != "null")
        .unwrap_or(fallback)
        .trim_end_matches('/')
        .to_string()
}

/// Decodes the body as JSON or as a form, per `Content-Type`.
async fn read_unlock_request(request: Request) -> ApiResult<(UnlockRequest, bool)> {
    if is_json(request.headers()) {
        let Json(body) = Json::<UnlockRequest>::from_request(request, &()).await?;
        Ok((body, true))
    } else {
        let Form(body) = Form::<UnlockRequest>::from_request(request, &()).await?;
        Ok((body, false))
    }
}

/// The caller's report named by the request, provided it is still locked.
async fn locked_report_for(
    state: &AppState,
    user: &AuthUser,
    body: &UnlockRequest,
) -> ApiResult<Report> {
    let raw_id = body
        .target()
        .ok_or_else(|| ApiError::BadRequest("Missing reportId/evaluationId".to_string()))?;

    let not_found = || ApiError::NotFound("Report not found".to_string());
    let report_id: ReportId = raw_id.parse().map_err(|_| not_found())?;
    let report = state
        .reports
        .get_for_owner(&report_id, &user.user_id)
        .await?
        .ok_or_else(not_found)?;

    if report.unlocked {
        return Err(already_unlocked());
    }
    Ok(report)
}

fn already_unlocked() -> ApiError {
    ApiError::BadRequest("Report already unlocked".to_string())
}
