pub mod common;
pub mod digest;
pub mod health;
pub mod subscription;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(subscription::router())
        .nest("/digest", digest::router())
}

/// Legacy edge-function paths.
pub fn functions_router() -> Router<AppState> {
    subscription::functions_router()
}
