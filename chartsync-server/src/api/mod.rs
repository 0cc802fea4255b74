//! HTTP API
//!
//! Thin handlers over the pipeline engines. Long-running work is
//! dispatched to detached tasks and the response returns immediately;
//! callers poll the store endpoints for eventual state.

pub mod genres;
pub mod health;
pub mod ingest;
pub mod missed;
pub mod publish;
pub mod reconcile;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;

use crate::error::{ApiError, ApiResult};
use crate::models::Credential;
use crate::services::auth_client::AuthError;
use crate::AppState;

/// Chart pipeline routes
pub fn chart_routes() -> Router<AppState> {
    Router::new()
        .route("/chart/ingest", post(ingest::ingest_chart))
        .route("/chart/missed", get(missed::get_missed))
        .route("/chart/reconcile", post(reconcile::reconcile))
        .route("/chart/publish", post(publish::publish_chart))
        .route("/chart/genres/archive", post(genres::archive_genres))
}

/// Validate the request's bearer token with the auth collaborator.
///
/// The returned credential carries the token to use downstream, which
/// may differ from the presented one when the collaborator refreshed it.
pub(crate) async fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<Credential> {
    let token = bearer_token(headers)?;

    state.auth.authenticate(token).await.map_err(|e| match e {
        AuthError::Rejected(msg) => ApiError::Unauthorized(msg),
        other => ApiError::Internal(other.to_string()),
    })
}

fn bearer_token(headers: &HeaderMap) -> ApiResult<&str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".to_string()))?;

    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized("malformed Authorization header".to_string()))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("expected a bearer token".to_string()))?;

    if token.is_empty() {
        return Err(ApiError::Unauthorized("empty bearer token".to_string()));
    }

    Ok(token)
}
