//! Chart ingest endpoint
//!
//! Kicks off the fetch-and-resolve run for one chart day as a detached
//! task and answers immediately. The date defaults to today in the chart
//! source's timezone; passing an explicit date backfills an earlier day.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::api::authenticate;
use crate::error::{ApiError, ApiResult};
use crate::pipeline::resolver::ResolutionEngine;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IngestRequest {
    /// Chart date override (`YYYY-MM-DD`); defaults to today in KST
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: String,
    pub date: NaiveDate,
}

/// POST /chart/ingest
pub async fn ingest_chart(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<IngestRequest>,
) -> ApiResult<Json<IngestResponse>> {
    let credential = authenticate(&state, &headers).await?;

    let date = match &request.date {
        Some(raw) => chartsync_common::time::parse_chart_date(raw)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => chartsync_common::time::kst_today(),
    };

    info!(date = %date, caller_id = %credential.caller_id, "Chart ingest requested");

    let engine = ResolutionEngine::new(state.db.clone(), Arc::clone(&state.catalog), state.limits);
    let charts = Arc::clone(&state.charts);

    tokio::spawn(async move {
        let entries = match charts.fetch_top_chart().await {
            Ok(entries) => entries,
            Err(e) => {
                error!(date = %date, error = %e, "Chart fetch failed, nothing ingested");
                return;
            }
        };

        let summary = engine.resolve_batch(&entries, date, &credential).await;
        info!(
            date = %date,
            resolved = summary.resolved,
            missed = summary.missed,
            "Background ingest complete"
        );
    });

    Ok(Json(IngestResponse {
        status: format!("Saving top chart tracks for date: {}", date),
        date,
    }))
}
