//! Genre reference rows and per-day genre chart snapshots

use chrono::NaiveDate;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use chartsync_common::Result;

/// One genre from the seeded reference table
#[derive(Debug, Clone, FromRow)]
pub struct Genre {
    pub code: String,
    pub name: String,
}

/// All genres in code order
pub async fn list_genres(pool: &SqlitePool) -> Result<Vec<Genre>> {
    let genres = sqlx::query_as::<_, Genre>("SELECT code, name FROM genres ORDER BY code")
        .fetch_all(pool)
        .await?;

    Ok(genres)
}

/// Append one song to a genre's snapshot for the day.
///
/// Snapshots are append-only; re-archiving a day adds new rows rather
/// than replacing the earlier run.
pub async fn insert_genre_track(
    pool: &SqlitePool,
    genre_code: &str,
    title: &str,
    artist: &str,
    archived_on: NaiveDate,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO genre_tracks (guid, genre_code, title, artist, archived_on)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(genre_code)
    .bind(title)
    .bind(artist)
    .bind(archived_on)
    .execute(pool)
    .await?;

    Ok(())
}

/// Number of archived genre tracks for a date
pub async fn count_genre_tracks(pool: &SqlitePool, date: NaiveDate) -> Result<usize> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genre_tracks WHERE archived_on = ?")
        .bind(date)
        .fetch_one(pool)
        .await?;

    Ok(count as usize)
}
