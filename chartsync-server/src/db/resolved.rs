//! Resolved track rows

use chrono::NaiveDate;
use sqlx::SqlitePool;

use chartsync_common::Result;

use crate::models::ResolvedTrack;

/// Insert one resolved track.
///
/// Deliberately a plain INSERT: the (date, rank) primary key rejects a
/// second resolution for an already-resolved chart slot, and callers
/// decide whether that is a logged drop (ingest) or a rollback
/// (reconciliation). Generic over the executor so the reconciler can run
/// it inside its migration transaction.
pub async fn insert_resolved_track<'e>(
    db: impl sqlx::SqliteExecutor<'e>,
    track: &ResolvedTrack,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO resolved_tracks (date, rank, title, artist, uri)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(track.date)
    .bind(track.rank)
    .bind(&track.title)
    .bind(&track.artist)
    .bind(&track.uri)
    .execute(db)
    .await?;

    Ok(())
}

/// All resolved tracks for a date, in rank order
pub async fn list_resolved_tracks(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<ResolvedTrack>> {
    let tracks = sqlx::query_as::<_, ResolvedTrack>(
        r#"
        SELECT rank, title, artist, uri, date
        FROM resolved_tracks
        WHERE date = ?
        ORDER BY rank
        "#,
    )
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(tracks)
}

/// Number of resolved tracks for a date
pub async fn count_resolved_tracks(pool: &SqlitePool, date: NaiveDate) -> Result<usize> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resolved_tracks WHERE date = ?")
        .bind(date)
        .fetch_one(pool)
        .await?;

    Ok(count as usize)
}
