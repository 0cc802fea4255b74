//! Genre chart archive
//!
//! Daily snapshot of each genre's newest songs, independent of the
//! top-chart pipeline. Genres are fetched with bounded concurrency; a
//! genre whose fetch fails is logged and skipped, and a single row
//! failure never drops the rest of its genre.

use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::db;
use crate::db::genres::Genre;
use crate::services::chart_client::ChartClient;

/// Concurrent genre fetches in flight
const GENRE_CONCURRENCY: usize = 4;

/// Fetch and store every genre's newest songs for `date`.
///
/// Returns the number of rows stored across all genres.
pub async fn archive_genre_charts(
    db: &SqlitePool,
    charts: Arc<ChartClient>,
    date: NaiveDate,
) -> chartsync_common::Result<usize> {
    let genres = db::genres::list_genres(db).await?;

    let semaphore = Arc::new(Semaphore::new(GENRE_CONCURRENCY));
    let mut tasks = Vec::with_capacity(genres.len());

    for genre in genres {
        let db = db.clone();
        let charts = Arc::clone(&charts);
        let semaphore = Arc::clone(&semaphore);

        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            archive_one_genre(&db, &charts, &genre, date).await
        }));
    }

    let mut total = 0;
    for task in tasks {
        match task.await {
            Ok(stored) => total += stored,
            Err(e) => error!(error = %e, "Genre archive task did not complete"),
        }
    }

    info!(date = %date, rows = total, "Genre archive complete");
    Ok(total)
}

async fn archive_one_genre(
    db: &SqlitePool,
    charts: &ChartClient,
    genre: &Genre,
    date: NaiveDate,
) -> usize {
    let entries = match charts.fetch_genre_chart(&genre.code).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(genre = %genre.name, error = %e, "Genre chart fetch failed, skipping genre");
            return 0;
        }
    };

    let mut stored = 0;
    for entry in &entries {
        match db::genres::insert_genre_track(db, &genre.code, &entry.title, &entry.artist, date)
            .await
        {
            Ok(()) => stored += 1,
            Err(e) => {
                warn!(genre = %genre.name, title = %entry.title, error = %e, "Failed to store genre track")
            }
        }
    }

    info!(genre = %genre.name, stored, "Saved genre chart songs");
    stored
}
