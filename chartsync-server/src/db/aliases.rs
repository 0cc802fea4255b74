//! Alias cache rows
//!
//! Each row remembers how a normalized (title, artist) pair that once
//! failed to resolve was eventually corrected, so later ingestions of
//! the same pair resolve without waiting for another correction. Rows
//! are written only by the reconciler, inside its migration
//! transaction.

use sqlx::SqlitePool;

use chartsync_common::Result;

use crate::models::ResolvedAlias;

/// Look up the alias for a normalized (title, artist) pair
pub async fn find_alias(
    pool: &SqlitePool,
    missed_title: &str,
    missed_artist: &str,
) -> Result<Option<ResolvedAlias>> {
    let alias = sqlx::query_as::<_, ResolvedAlias>(
        r#"
        SELECT missed_title, missed_artist, title, artist, uri
        FROM resolved_aliases
        WHERE missed_title = ? AND missed_artist = ?
        "#,
    )
    .bind(missed_title)
    .bind(missed_artist)
    .fetch_optional(pool)
    .await?;

    Ok(alias)
}

/// Insert an alias, or overwrite the stored resolution when the missed
/// pair was corrected before.
///
/// Generic over the executor so the reconciler can run it inside its
/// migration transaction.
pub async fn upsert_alias<'e>(
    db: impl sqlx::SqliteExecutor<'e>,
    alias: &ResolvedAlias,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO resolved_aliases (missed_title, missed_artist, title, artist, uri)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(missed_title, missed_artist) DO UPDATE SET
            title = excluded.title,
            artist = excluded.artist,
            uri = excluded.uri,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&alias.missed_title)
    .bind(&alias.missed_artist)
    .bind(&alias.title)
    .bind(&alias.artist)
    .bind(&alias.uri)
    .execute(db)
    .await?;

    Ok(())
}
