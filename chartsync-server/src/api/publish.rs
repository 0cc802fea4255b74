//! Playlist publish endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::authenticate;
use crate::error::{ApiError, ApiResult};
use crate::pipeline::publisher;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    /// Chart date (`YYYY-MM-DD`) whose resolved ranking to publish
    pub date: String,

    /// Target playlist; falls back to the configured default
    #[serde(default)]
    pub playlist_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub added: usize,
    pub missed: usize,
    pub status: String,
}

/// POST /chart/publish
///
/// The counts come back immediately; the playlist mutation itself runs
/// detached.
pub async fn publish_chart(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PublishRequest>,
) -> ApiResult<Json<PublishResponse>> {
    let credential = authenticate(&state, &headers).await?;

    let date = chartsync_common::time::parse_chart_date(&request.date)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let playlist_id = request
        .playlist_id
        .or_else(|| state.default_playlist_id.clone())
        .ok_or_else(|| {
            ApiError::BadRequest("no playlist id provided and no default configured".to_string())
        })?;

    info!(date = %date, playlist_id = %playlist_id, caller_id = %credential.caller_id, "Publish requested");

    let summary = publisher::publish(
        &state.db,
        Arc::clone(&state.catalog),
        date,
        playlist_id,
        credential,
    )
    .await?;

    Ok(Json(PublishResponse {
        added: summary.added,
        missed: summary.missed,
        status: format!(
            "Added {} tracks and missed {} tracks",
            summary.added, summary.missed
        ),
    }))
}
