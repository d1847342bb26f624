use bitechina_types::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or rejected bearer token. Never retried; the client treats it as signed out.
    #[error("{0}")]
    Unauthenticated(String),

    /// Missing or invalid deployment configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Active subscription is billed in {current}, requested price is in {desired}")]
    CurrencyMismatch { current: String, desired: String },

    /// Checkout session creation rejected because the customer already has
    /// objects in a different currency.
    #[error("Payment processor rejected currency combination: {0}")]
    CurrencyCombination(String),

    /// Payment processor, identity provider or email provider failure.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Unauthenticated(_) => ErrorCode::Unauthenticated,
            AppError::Configuration(_) => ErrorCode::ConfigurationError,
            AppError::CurrencyMismatch { .. } => ErrorCode::CurrencyMismatch,
            AppError::CurrencyCombination(_) | AppError::Upstream(_) => ErrorCode::UpstreamError,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
