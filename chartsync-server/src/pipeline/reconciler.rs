//! Reconciliation engine
//!
//! Applies caller-supplied corrections to missed tracks. Each correction
//! re-queries the catalog with the corrected names exactly as given; on
//! a match the row migrates from missed to resolved inside one
//! transaction that also records the alias for future ingestions.

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::db;
use crate::models::{Correction, Credential, ResolvedAlias, ResolvedTrack};
use crate::types::{Catalog, TrackMatch};

/// Counts for one reconciliation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub applied: usize,
    pub skipped: usize,
}

/// Apply corrections one at a time.
///
/// Correction volume is small and the three-way write matters more than
/// latency, so there is no fan-out here. A correction the catalog cannot
/// confirm is skipped with its missed row left intact for another
/// attempt; one failed correction never stops the rest.
pub async fn apply_corrections(
    db: &SqlitePool,
    catalog: &dyn Catalog,
    corrections: &[Correction],
    credential: &Credential,
) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();

    for correction in corrections {
        let found = match catalog
            .search(&correction.title, &correction.artist, credential)
            .await
        {
            Ok(Some(found)) => found,
            Ok(None) => {
                warn!(
                    rank = correction.rank,
                    date = %correction.date,
                    title = %correction.title,
                    artist = %correction.artist,
                    "Corrected entry still has no catalog match, skipping"
                );
                outcome.skipped += 1;
                continue;
            }
            Err(e) => {
                warn!(rank = correction.rank, date = %correction.date, error = %e, "Catalog search for correction failed, skipping");
                outcome.skipped += 1;
                continue;
            }
        };

        match migrate_missed_track(db, correction, &found).await {
            Ok(()) => {
                info!(rank = correction.rank, date = %correction.date, uri = %found.uri, "Correction applied");
                outcome.applied += 1;
            }
            Err(e) => {
                warn!(rank = correction.rank, date = %correction.date, error = %e, "Correction rolled back, missed row left intact");
                outcome.skipped += 1;
            }
        }
    }

    info!(
        applied = outcome.applied,
        skipped = outcome.skipped,
        "Reconciliation run complete"
    );
    outcome
}

/// Move one missed track to resolved.
///
/// Three writes land together or not at all: the alias keyed by the
/// original missed pair, the missed-row delete, and the resolved-row
/// insert. The insert hits the (date, rank) primary key if the slot was
/// resolved in the meantime, rolling the whole migration back.
async fn migrate_missed_track(
    db: &SqlitePool,
    correction: &Correction,
    found: &TrackMatch,
) -> chartsync_common::Result<()> {
    let mut tx = db.begin().await?;

    db::aliases::upsert_alias(
        &mut *tx,
        &ResolvedAlias {
            missed_title: correction.missed_title.clone(),
            missed_artist: correction.missed_artist.clone(),
            title: found.title.clone(),
            artist: found.artist.clone(),
            uri: found.uri.clone(),
        },
    )
    .await?;

    let deleted = db::missed::delete_missed_track(&mut *tx, correction.date, correction.rank).await?;
    if !deleted {
        debug!(rank = correction.rank, date = %correction.date, "No missed row to delete for correction");
    }

    db::resolved::insert_resolved_track(
        &mut *tx,
        &ResolvedTrack {
            rank: correction.rank,
            title: found.title.clone(),
            artist: found.artist.clone(),
            uri: found.uri.clone(),
            date: correction.date,
        },
    )
    .await?;

    tx.commit().await?;
    Ok(())
}
