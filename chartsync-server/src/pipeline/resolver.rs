//! Resolution engine
//!
//! Takes one day's chart batch and decides, for every entry, whether it
//! resolves to a catalog track or lands in the missed table. Lookups fan
//! out concurrently; their outcomes flow through a single queue to one
//! consumer that persists rows as they arrive. The queue stays open
//! until every lookup has finished, so nothing is lost when slow entries
//! straggle in.

use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, warn};

use crate::db;
use crate::models::{ChartEntry, Credential, MissedTrack, ResolveSummary, ResolvedTrack};
use crate::normalize::{normalize_artist, normalize_title};
use crate::types::Catalog;

/// Fan-out limits for one resolution batch
#[derive(Debug, Clone, Copy)]
pub struct ResolverLimits {
    /// Concurrent catalog lookups in flight
    pub catalog_concurrency: usize,
}

impl Default for ResolverLimits {
    fn default() -> Self {
        Self {
            catalog_concurrency: 16,
        }
    }
}

/// One lookup outcome flowing from the lookup tasks to the consumer
#[derive(Debug)]
enum Outcome {
    Resolved(ResolvedTrack),
    Missed(MissedTrack),
}

/// Which way a lookup went, for summary counting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutcomeKind {
    Resolved,
    Missed,
}

/// Resolves chart batches against the catalog
pub struct ResolutionEngine {
    db: SqlitePool,
    catalog: Arc<dyn Catalog>,
    limits: ResolverLimits,
}

impl ResolutionEngine {
    pub fn new(db: SqlitePool, catalog: Arc<dyn Catalog>, limits: ResolverLimits) -> Self {
        Self { db, catalog, limits }
    }

    /// Resolve a chart batch for `date` and persist every outcome.
    ///
    /// Returns only after the consumer has drained the queue, so callers
    /// observe fully persisted state. An empty batch touches neither the
    /// catalog nor the store.
    pub async fn resolve_batch(
        &self,
        entries: &[ChartEntry],
        date: NaiveDate,
        credential: &Credential,
    ) -> ResolveSummary {
        if entries.is_empty() {
            return ResolveSummary::default();
        }

        // Sized to the batch so no lookup ever blocks on a full queue
        let (tx, rx) = mpsc::channel::<Outcome>(entries.len());
        let consumer = tokio::spawn(persist_outcomes(self.db.clone(), rx));

        let semaphore = Arc::new(Semaphore::new(self.limits.catalog_concurrency.max(1)));
        let mut lookups = Vec::with_capacity(entries.len());

        for entry in entries {
            let entry = entry.clone();
            let tx = tx.clone();
            let semaphore = Arc::clone(&semaphore);
            let catalog = Arc::clone(&self.catalog);
            let db = self.db.clone();
            let credential = credential.clone();

            lookups.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                resolve_entry(&db, catalog.as_ref(), entry, date, &credential, &tx).await
            }));
        }

        // The lookup tasks now hold the only senders; the consumer sees
        // the queue close exactly when the last lookup finishes.
        drop(tx);

        let mut summary = ResolveSummary::default();
        for lookup in lookups {
            match lookup.await {
                Ok(OutcomeKind::Resolved) => summary.resolved += 1,
                Ok(OutcomeKind::Missed) => summary.missed += 1,
                Err(e) => {
                    error!(error = %e, "Lookup task did not complete");
                    summary.missed += 1;
                }
            }
        }

        if let Err(e) = consumer.await {
            error!(error = %e, "Outcome consumer did not complete");
        }

        info!(
            date = %date,
            resolved = summary.resolved,
            missed = summary.missed,
            "Resolution batch complete"
        );

        summary
    }
}

/// Resolve one entry: normalize, search the catalog, fall back to the
/// alias cache, finally record a miss.
async fn resolve_entry(
    db: &SqlitePool,
    catalog: &dyn Catalog,
    entry: ChartEntry,
    date: NaiveDate,
    credential: &Credential,
    tx: &mpsc::Sender<Outcome>,
) -> OutcomeKind {
    let title = normalize_title(&entry.title);
    let artist = normalize_artist(&entry.artist);

    match catalog.search(&title, &artist, credential).await {
        Ok(Some(found)) => {
            let track = ResolvedTrack {
                rank: entry.rank,
                title: found.title,
                artist: found.artist,
                uri: found.uri,
                date,
            };
            send_outcome(tx, Outcome::Resolved(track)).await;
            OutcomeKind::Resolved
        }
        Ok(None) => consult_alias_cache(db, entry.rank, title, artist, date, tx).await,
        Err(e) => {
            debug!(rank = entry.rank, error = %e, "Catalog search failed, consulting alias cache");
            consult_alias_cache(db, entry.rank, title, artist, date, tx).await
        }
    }
}

/// Alias cache fallback: a hit resolves the entry from the stored
/// correction, a miss records it for manual correction.
async fn consult_alias_cache(
    db: &SqlitePool,
    rank: i64,
    title: String,
    artist: String,
    date: NaiveDate,
    tx: &mpsc::Sender<Outcome>,
) -> OutcomeKind {
    match db::aliases::find_alias(db, &title, &artist).await {
        Ok(Some(alias)) => {
            info!(rank, title = %title, artist = %artist, uri = %alias.uri, "Resolved from alias cache");
            let track = ResolvedTrack {
                rank,
                title: alias.title,
                artist: alias.artist,
                uri: alias.uri,
                date,
            };
            send_outcome(tx, Outcome::Resolved(track)).await;
            OutcomeKind::Resolved
        }
        Ok(None) => {
            info!(rank, title = %title, artist = %artist, "No catalog match or alias, recording as missed");
            let track = MissedTrack { rank, title, artist, date };
            send_outcome(tx, Outcome::Missed(track)).await;
            OutcomeKind::Missed
        }
        Err(e) => {
            warn!(rank, error = %e, "Alias lookup failed, recording as missed");
            let track = MissedTrack { rank, title, artist, date };
            send_outcome(tx, Outcome::Missed(track)).await;
            OutcomeKind::Missed
        }
    }
}

async fn send_outcome(tx: &mpsc::Sender<Outcome>, outcome: Outcome) {
    // Only fails if the consumer died early; the row is lost but the
    // batch keeps going
    if let Err(e) = tx.send(outcome).await {
        error!(error = %e, "Outcome queue closed before the result could be enqueued");
    }
}

/// Drain the outcome queue, writing each row as it arrives.
///
/// Runs until every lookup task has dropped its sender. A failed write
/// (including a duplicate chart slot) is logged and that single row
/// dropped; it never stops the batch.
async fn persist_outcomes(db: SqlitePool, mut rx: mpsc::Receiver<Outcome>) {
    while let Some(outcome) = rx.recv().await {
        match outcome {
            Outcome::Resolved(track) => {
                if let Err(e) = db::resolved::insert_resolved_track(&db, &track).await {
                    error!(rank = track.rank, date = %track.date, error = %e, "Failed to store resolved track");
                }
            }
            Outcome::Missed(track) => {
                if let Err(e) = db::missed::insert_missed_track(&db, &track).await {
                    error!(rank = track.rank, date = %track.date, error = %e, "Failed to store missed track");
                }
            }
        }
    }
}
