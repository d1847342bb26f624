//! The `{success, data, message}` wrapper every content/profile API response uses.

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::Deserialize;

use crate::error::SdkError;

/// A decoded response envelope. Either the call succeeded and carries data,
/// or it failed with a message.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiEnvelope<T> {
    Success { data: T, message: Option<String> },
    Failure { message: String },
}

#[derive(Deserialize)]
struct RawEnvelope {
    success: bool,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    message: Option<String>,
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ApiEnvelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawEnvelope::deserialize(deserializer)?;
        if !raw.success {
            return Ok(ApiEnvelope::Failure {
                message: raw.message.unwrap_or_default(),
            });
        }
        let data = serde_json::from_value(raw.data).map_err(D::Error::custom)?;
        Ok(ApiEnvelope::Success {
            data,
            message: raw.message,
        })
    }
}

impl<T> ApiEnvelope<T> {
    /// Unwraps the data, turning a failure into `SdkError::Envelope` with
    /// `fallback` when the server sent no message.
    pub fn into_result(self, fallback: &str) -> Result<T, SdkError> {
        match self {
            ApiEnvelope::Success { data, .. } => Ok(data),
            ApiEnvelope::Failure { message } if message.is_empty() => {
                Err(SdkError::Envelope(fallback.to_string()))
            }
            ApiEnvelope::Failure { message } => Err(SdkError::Envelope(message)),
        }
    }
}
