use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
};
use bitechina_types::{CheckoutRequest, CheckoutResponse, SubscriptionSnapshot};

use crate::{
    adapters::http::{
        app_state::AppState,
        routes::common::{bearer_token, request_origin},
    },
    app_error::AppResult,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subscription/status", get(check_subscription))
        .route("/checkout", post(create_checkout))
}

pub fn functions_router() -> Router<AppState> {
    Router::new()
        .route("/check-subscription", post(check_subscription))
        .route("/create-checkout", post(create_checkout))
}

async fn check_subscription(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<SubscriptionSnapshot>> {
    let token = bearer_token(&headers)?;
    let snapshot = app_state.subscription_use_cases.check_status(token).await?;
    Ok(Json(snapshot))
}

async fn create_checkout(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<CheckoutResponse>> {
    let token = bearer_token(&headers)?;
    let request = parse_checkout_request(&body);
    let origin = request_origin(&headers, app_state.config.app_origin_str());

    let url = app_state
        .subscription_use_cases
        .create_checkout(token, &request, &origin)
        .await?;
    Ok(Json(CheckoutResponse { url }))
}

/// Region and locale are hints; an empty or malformed body means no hints.
fn parse_checkout_request(body: &[u8]) -> CheckoutRequest {
    if body.iter().all(u8::is_ascii_whitespace) {
        return CheckoutRequest::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Ignoring unparsable checkout body");
        CheckoutRequest::default()
    })
}
