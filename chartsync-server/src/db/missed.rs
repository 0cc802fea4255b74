//! Missed track rows

use chrono::NaiveDate;
use sqlx::SqlitePool;

use chartsync_common::Result;

use crate::models::MissedTrack;

/// Insert one missed track. The (date, rank) primary key rejects a
/// duplicate record for the same chart slot.
pub async fn insert_missed_track(pool: &SqlitePool, track: &MissedTrack) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO missed_tracks (date, rank, title, artist)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(track.date)
    .bind(track.rank)
    .bind(&track.title)
    .bind(&track.artist)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete the missed track for one chart slot, returning whether a row
/// existed. Generic over the executor so the reconciler can run it
/// inside its migration transaction.
pub async fn delete_missed_track<'e>(
    db: impl sqlx::SqliteExecutor<'e>,
    date: NaiveDate,
    rank: i64,
) -> Result<bool> {
    let deleted = sqlx::query("DELETE FROM missed_tracks WHERE date = ? AND rank = ?")
        .bind(date)
        .bind(rank)
        .execute(db)
        .await?
        .rows_affected();

    Ok(deleted > 0)
}

/// All missed tracks for a date, in rank order
pub async fn list_missed_tracks(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<MissedTrack>> {
    let tracks = sqlx::query_as::<_, MissedTrack>(
        r#"
        SELECT rank, title, artist, date
        FROM missed_tracks
        WHERE date = ?
        ORDER BY rank
        "#,
    )
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(tracks)
}

/// Number of missed tracks for a date
pub async fn count_missed_tracks(pool: &SqlitePool, date: NaiveDate) -> Result<usize> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM missed_tracks WHERE date = ?")
        .bind(date)
        .fetch_one(pool)
        .await?;

    Ok(count as usize)
}
