//! Playlist publisher
//!
//! Reads a date's resolved ranking and pushes the URIs to a catalog
//! playlist. The push runs detached from the caller's response; the
//! returned summary reflects store contents at the time of the request.

use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::db;
use crate::models::{Credential, PublishSummary};
use crate::types::Catalog;

/// Count a date's resolved and missed rows, then submit the resolved
/// URIs to `playlist_id` in rank order as a detached task.
///
/// A failed submission is logged, not retried; callers re-trigger
/// publishing if the playlist comes up short.
pub async fn publish(
    db: &SqlitePool,
    catalog: Arc<dyn Catalog>,
    date: NaiveDate,
    playlist_id: String,
    credential: Credential,
) -> chartsync_common::Result<PublishSummary> {
    let resolved = db::resolved::list_resolved_tracks(db, date).await?;
    let missed = db::missed::count_missed_tracks(db, date).await?;

    let summary = PublishSummary {
        added: resolved.len(),
        missed,
    };

    // list_resolved_tracks returns rank order; keep it for the playlist
    let uris: Vec<String> = resolved.into_iter().map(|t| t.uri).collect();

    tokio::spawn(async move {
        if uris.is_empty() {
            info!(date = %date, "No resolved tracks to publish");
            return;
        }

        match catalog.add_tracks(&playlist_id, &uris, &credential).await {
            Ok(()) => {
                info!(date = %date, playlist_id = %playlist_id, count = uris.len(), "Published resolved tracks")
            }
            Err(e) => {
                error!(date = %date, playlist_id = %playlist_id, error = %e, "Failed to add tracks to playlist")
            }
        }
    });

    Ok(summary)
}
