//! Database initialization
//!
//! Creates the SQLite database on first run and brings the schema up
//! idempotently. The table-creation functions are public so tests can
//! build exactly the tables they need against an in-memory pool.

use std::path::Path;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

use crate::Result;

/// Open (creating if necessary) the database and bring the schema up
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL lets the ingest consumer write while readers poll missed rows
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_resolved_tracks_table(&pool).await?;
    create_missed_tracks_table(&pool).await?;
    create_resolved_aliases_table(&pool).await?;
    create_genres_table(&pool).await?;
    create_genre_tracks_table(&pool).await?;

    Ok(pool)
}

/// Daily chart entries resolved to a catalog track.
///
/// The (date, rank) primary key makes the resolved side of a chart slot
/// first-writer-wins: a second resolution for the same slot is rejected
/// by the constraint instead of overwriting.
pub async fn create_resolved_tracks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS resolved_tracks (
            date TEXT NOT NULL,
            rank INTEGER NOT NULL,
            title TEXT NOT NULL,
            artist TEXT NOT NULL,
            uri TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (date, rank)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Daily chart entries the catalog could not match, awaiting correction
pub async fn create_missed_tracks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS missed_tracks (
            date TEXT NOT NULL,
            rank INTEGER NOT NULL,
            title TEXT NOT NULL,
            artist TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (date, rank)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Confirmed corrections keyed by the normalized pair that originally
/// failed to resolve. Future ingestions consult this before giving up.
pub async fn create_resolved_aliases_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS resolved_aliases (
            missed_title TEXT NOT NULL,
            missed_artist TEXT NOT NULL,
            title TEXT NOT NULL,
            artist TEXT NOT NULL,
            uri TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (missed_title, missed_artist)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Genre reference table, seeded with the chart source's genre codes
pub async fn create_genres_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS genres (
            code TEXT PRIMARY KEY,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    let seeds = [
        ("GN0100", "Ballad"),
        ("GN0200", "Dance"),
        ("GN0300", "Rap/Hip-hop"),
        ("GN0400", "R&B/Soul"),
        ("GN0500", "Indie"),
        ("GN0600", "Rock/Metal"),
        ("GN0700", "Trot"),
        ("GN0800", "Folk/Blues"),
    ];

    for (code, name) in seeds {
        sqlx::query("INSERT OR IGNORE INTO genres (code, name) VALUES (?, ?)")
            .bind(code)
            .bind(name)
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// Per-day snapshots of each genre's newest songs
pub async fn create_genre_tracks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS genre_tracks (
            guid TEXT PRIMARY KEY,
            genre_code TEXT NOT NULL REFERENCES genres(code),
            title TEXT NOT NULL,
            artist TEXT NOT NULL,
            archived_on TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_genre_tracks_archived_on ON genre_tracks(archived_on)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
