//! Shared fixtures for the integration tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use chartsync_server::models::Credential;
use chartsync_server::services::auth_client::AuthError;
use chartsync_server::services::catalog_client::CatalogError;
use chartsync_server::types::{AuthVerifier, Catalog, TrackMatch};

/// In-memory pool capped at one connection so concurrent tasks all see
/// the same database
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .unwrap();

    chartsync_common::db::init::create_resolved_tracks_table(&pool)
        .await
        .unwrap();
    chartsync_common::db::init::create_missed_tracks_table(&pool)
        .await
        .unwrap();
    chartsync_common::db::init::create_resolved_aliases_table(&pool)
        .await
        .unwrap();
    chartsync_common::db::init::create_genres_table(&pool).await.unwrap();
    chartsync_common::db::init::create_genre_tracks_table(&pool)
        .await
        .unwrap();

    pool
}

pub fn credential() -> Credential {
    Credential {
        access_token: "test-token".to_string(),
        caller_id: "tester".to_string(),
    }
}

pub fn chart_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
}

/// Catalog stub answering from a fixed (title, artist) table, recording
/// search volume and playlist mutations
pub struct ScriptedCatalog {
    matches: HashMap<(String, String), TrackMatch>,
    search_calls: AtomicUsize,
    pub added: Mutex<Vec<(String, Vec<String>)>>,
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self {
            matches: HashMap::new(),
            search_calls: AtomicUsize::new(0),
            added: Mutex::new(Vec::new()),
        }
    }

    /// Script a hit: searching exactly (title, artist) returns `uri`,
    /// echoing the queried names back as the canonical ones
    pub fn with_match(mut self, title: &str, artist: &str, uri: &str) -> Self {
        self.matches.insert(
            (title.to_string(), artist.to_string()),
            TrackMatch {
                uri: uri.to_string(),
                title: title.to_string(),
                artist: artist.to_string(),
                popularity: 50,
            },
        );
        self
    }

    pub fn search_count(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Catalog for ScriptedCatalog {
    async fn search(
        &self,
        title: &str,
        artist: &str,
        _credential: &Credential,
    ) -> Result<Option<TrackMatch>, CatalogError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .matches
            .get(&(title.to_string(), artist.to_string()))
            .cloned())
    }

    async fn add_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
        _credential: &Credential,
    ) -> Result<(), CatalogError> {
        self.added
            .lock()
            .await
            .push((playlist_id.to_string(), uris.to_vec()));
        Ok(())
    }
}

/// Auth stub accepting every token
pub struct AllowAllAuth;

#[async_trait]
impl AuthVerifier for AllowAllAuth {
    async fn authenticate(&self, access_token: &str) -> Result<Credential, AuthError> {
        Ok(Credential {
            access_token: access_token.to_string(),
            caller_id: "tester".to_string(),
        })
    }
}

/// Auth stub rejecting every token
pub struct RejectAllAuth;

#[async_trait]
impl AuthVerifier for RejectAllAuth {
    async fn authenticate(&self, _access_token: &str) -> Result<Credential, AuthError> {
        Err(AuthError::Rejected("token expired".to_string()))
    }
}
