use crate::app_error::AppError;
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bitechina_types::{CurrencyMismatchBody, ErrorBody, ErrorCode};

const CURRENCY_MISMATCH_MESSAGE: &str = "You have an active subscription in a different currency. \
     Please cancel your current subscription before switching currencies.";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = %self, code = %self.code(), "Request failed");

        let code = self.code();
        match self {
            AppError::CurrencyMismatch { current, desired } => (
                StatusCode::BAD_REQUEST,
                Json(CurrencyMismatchBody {
                    error: ErrorCode::CurrencyMismatch,
                    message: CURRENCY_MISMATCH_MESSAGE.to_string(),
                    current_currency: current,
                    desired_currency: desired,
                }),
            )
                .into_response(),
            AppError::Unauthenticated(msg) => error_resp(StatusCode::UNAUTHORIZED, code, msg),
            AppError::NotFound => error_resp(StatusCode::NOT_FOUND, code, "Not found".into()),
            e @ (AppError::Configuration(_)
            | AppError::CurrencyCombination(_)
            | AppError::Upstream(_)) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, e.to_string())
            }
            // Database and internal details stay in the logs.
            AppError::Database(_) | AppError::Internal(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                code,
                "Internal server error".into(),
            ),
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: String) -> Response {
    let body = ErrorBody {
        error: message,
        code: Some(code),
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn render(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_unauthenticated_is_401_with_code() {
        let error = AppError::Unauthenticated("No authorization header provided".into());

        let (status, body) = render(error).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "No authorization header provided");
        assert_eq!(body["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn test_currency_mismatch_body_carries_both_currencies() {
        let (status, body) = render(AppError::CurrencyMismatch {
            current: "usd".into(),
            desired: "krw".into(),
        })
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "CURRENCY_MISMATCH");
        assert_eq!(body["currentCurrency"], "usd");
        assert_eq!(body["desiredCurrency"], "krw");
    }

    #[tokio::test]
    async fn test_upstream_message_is_exposed() {
        let (status, body) = render(AppError::Upstream("Stripe error: boom".into())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Upstream error: Stripe error: boom");
        assert_eq!(body["code"], "UPSTREAM_ERROR");
    }

    #[tokio::test]
    async fn test_database_details_stay_internal() {
        let (status, body) = render(AppError::Database("relation missing".into())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["code"], "DATABASE_ERROR");
    }

    #[tokio::test]
    async fn test_not_found_is_404() {
        let (status, body) = render(AppError::NotFound).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
