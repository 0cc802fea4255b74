//! Core data model for the chart pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One ranked (title, artist) pair scraped from the daily chart.
///
/// Produced fresh for every ingestion run and never persisted directly;
/// resolution turns it into either a [`ResolvedTrack`] or a
/// [`MissedTrack`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub rank: i64,
    pub title: String,
    pub artist: String,
}

/// A chart entry resolved to a canonical catalog track.
///
/// Title, artist and URI are the catalog's canonical forms, which may
/// differ from the raw chart strings. At most one row exists per
/// (date, rank).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ResolvedTrack {
    pub rank: i64,
    pub title: String,
    pub artist: String,
    pub uri: String,
    pub date: NaiveDate,
}

/// A chart entry the catalog could not match.
///
/// Title and artist are stored in normalized form so callers correcting
/// them see exactly what the failed search used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MissedTrack {
    pub rank: i64,
    pub title: String,
    pub artist: String,
    pub date: NaiveDate,
}

/// A confirmed correction keyed by the normalized pair that originally
/// failed to resolve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ResolvedAlias {
    pub missed_title: String,
    pub missed_artist: String,
    pub title: String,
    pub artist: String,
    pub uri: String,
}

/// Caller-supplied correction for one missed track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    /// Chart position of the missed row being corrected
    pub rank: i64,
    /// Normalized title as stored in the missed row
    pub missed_title: String,
    /// Normalized artist as stored in the missed row
    pub missed_artist: String,
    /// Corrected title to search the catalog with, used verbatim
    pub title: String,
    /// Corrected artist to search the catalog with, used verbatim
    pub artist: String,
    /// Chart date of the missed row
    pub date: NaiveDate,
}

/// Validated access token plus caller identity from the auth collaborator
#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: String,
    pub caller_id: String,
}

/// Outcome counts for one resolution batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolveSummary {
    pub resolved: usize,
    pub missed: usize,
}

/// Resolved/missed row counts behind a publish request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishSummary {
    pub added: usize,
    pub missed: usize,
}
