use async_trait::async_trait;
use uuid::Uuid;

use crate::app_error::AppResult;

/// An authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

/// Resolves a bearer token to the identity that owns it.
///
/// Implementations return `AppError::Unauthenticated` when the token is
/// rejected or the user has no email address.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_user(&self, access_token: &str) -> AppResult<Identity>;
}
