use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use secrecy::ExposeSecret;
use serde_json::{Value, json};

use crate::{
    adapters::http::{
        app_state::AppState,
        routes::common::{bearer_token, constant_time_eq},
    },
    app_error::{AppError, AppResult},
    use_cases::digest::DigestOutcome,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/send", post(send_digest))
}

async fn send_digest(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<Value>> {
    // Unconfigured trigger token means the route is not exposed.
    let Some(expected) = app_state.config.digest_trigger_token.as_ref() else {
        return Err(AppError::NotFound);
    };
    let token = bearer_token(&headers)?;
    if !constant_time_eq(token.as_bytes(), expected.expose_secret().as_bytes()) {
        return Err(AppError::Unauthenticated("Invalid digest trigger token".into()));
    }

    let outcome = app_state.digest_use_cases.dispatch_pending().await?;
    Ok(Json(outcome_body(&outcome)))
}

fn outcome_body(outcome: &DigestOutcome) -> Value {
    match outcome {
        DigestOutcome::Sent(summary) => json!(summary),
        other => json!({ "message": other.message() }),
    }
}
