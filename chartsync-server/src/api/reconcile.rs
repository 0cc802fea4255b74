//! Reconciliation endpoint
//!
//! Validates synchronously, then applies the corrections in a detached
//! task. The acknowledgement only promises the run was dispatched;
//! callers re-read /chart/missed to see what stuck.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::authenticate;
use crate::error::{ApiError, ApiResult};
use crate::models::Correction;
use crate::pipeline::reconciler;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub corrections: Vec<Correction>,
}

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub status: String,
}

/// POST /chart/reconcile
pub async fn reconcile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ReconcileRequest>,
) -> ApiResult<Json<ReconcileResponse>> {
    let credential = authenticate(&state, &headers).await?;

    if request.corrections.is_empty() {
        return Err(ApiError::BadRequest("no corrections provided".to_string()));
    }

    info!(
        count = request.corrections.len(),
        caller_id = %credential.caller_id,
        "Reconciliation requested"
    );

    let db = state.db.clone();
    let catalog = Arc::clone(&state.catalog);

    tokio::spawn(async move {
        let outcome =
            reconciler::apply_corrections(&db, catalog.as_ref(), &request.corrections, &credential)
                .await;
        info!(
            applied = outcome.applied,
            skipped = outcome.skipped,
            "Background reconciliation complete"
        );
    });

    Ok(Json(ReconcileResponse {
        status: "Resolving missed tracks asynchronously".to_string(),
    }))
}
