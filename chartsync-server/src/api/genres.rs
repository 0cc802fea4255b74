//! Genre archive endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use tracing::{error, info};

use crate::api::authenticate;
use crate::error::ApiResult;
use crate::pipeline::genre_archive;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct GenreArchiveResponse {
    pub status: String,
}

/// POST /chart/genres/archive
///
/// Snapshots every genre's newest songs for today (KST) in a detached
/// task.
pub async fn archive_genres(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<GenreArchiveResponse>> {
    let credential = authenticate(&state, &headers).await?;

    let date = chartsync_common::time::kst_today();

    info!(date = %date, caller_id = %credential.caller_id, "Genre archive requested");

    let db = state.db.clone();
    let charts = Arc::clone(&state.charts);

    tokio::spawn(async move {
        match genre_archive::archive_genre_charts(&db, charts, date).await {
            Ok(rows) => info!(date = %date, rows, "Background genre archive complete"),
            Err(e) => error!(date = %date, error = %e, "Genre archive failed"),
        }
    });

    Ok(Json(GenreArchiveResponse {
        status: format!("Archiving genre charts for date: {}", date),
    }))
}
