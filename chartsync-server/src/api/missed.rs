//! Missed track read endpoint

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::api::authenticate;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::MissedTrack;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MissedQuery {
    /// Chart date (`YYYY-MM-DD`)
    pub date: String,
}

/// GET /chart/missed?date=YYYY-MM-DD
///
/// Empty list means nothing is waiting for correction on that date.
pub async fn get_missed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MissedQuery>,
) -> ApiResult<Json<Vec<MissedTrack>>> {
    authenticate(&state, &headers).await?;

    let date = chartsync_common::time::parse_chart_date(&query.date)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let tracks = db::missed::list_missed_tracks(&state.db, date).await?;
    Ok(Json(tracks))
}
