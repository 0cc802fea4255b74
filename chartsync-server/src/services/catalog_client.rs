//! Track catalog client
//!
//! Search and playlist mutation against the catalog's REST API. Requests
//! carry the caller's bearer token; the client itself holds no
//! credentials.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::Credential;
use crate::services::RateLimiter;
use crate::types::{Catalog, TrackMatch};

const USER_AGENT: &str = "chartsync/0.1";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Minimum spacing between catalog requests. Keeps a full chart batch
/// under the catalog's per-client rate limits.
const RATE_LIMIT_MS: u64 = 100;

/// Catalog lookup errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network failure (timeout, connection refused)
    #[error("Network error: {0}")]
    Network(String),

    /// Catalog returned a non-success status
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: SearchTracks,
}

#[derive(Debug, Deserialize)]
struct SearchTracks {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    name: String,
    artists: Vec<SearchArtist>,
    uri: String,
    #[serde(default)]
    popularity: i64,
}

#[derive(Debug, Deserialize)]
struct SearchArtist {
    name: String,
}

/// HTTP client for the track catalog
pub struct CatalogClient {
    http_client: reqwest::Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::new(RATE_LIMIT_MS),
        })
    }
}

/// First search hit, falling back to the queried artist when the item
/// carries no artist credits
fn best_match(response: SearchResponse, queried_artist: &str) -> Option<TrackMatch> {
    let item = response.tracks.items.into_iter().next()?;

    let artist = item
        .artists
        .into_iter()
        .next()
        .map(|a| a.name)
        .unwrap_or_else(|| queried_artist.to_string());

    Some(TrackMatch {
        uri: item.uri,
        title: item.name,
        artist,
        popularity: item.popularity,
    })
}

#[async_trait]
impl Catalog for CatalogClient {
    async fn search(
        &self,
        title: &str,
        artist: &str,
        credential: &Credential,
    ) -> Result<Option<TrackMatch>, CatalogError> {
        self.rate_limiter.wait().await;

        let query = format!("track:{} artist:{}", title, artist);
        let url = format!("{}/search", self.base_url);

        debug!(title = %title, artist = %artist, "Searching catalog");

        let response = self
            .http_client
            .get(&url)
            .query(&[("q", query.as_str()), ("type", "track")])
            .bearer_auth(&credential.access_token)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api(status.as_u16(), body));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;

        match best_match(parsed, artist) {
            Some(found) => {
                debug!(uri = %found.uri, popularity = found.popularity, "Catalog match");
                Ok(Some(found))
            }
            None => {
                info!(title = %title, artist = %artist, "No catalog match");
                Ok(None)
            }
        }
    }

    async fn add_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
        credential: &Credential,
    ) -> Result<(), CatalogError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/playlists/{}/tracks", self.base_url, playlist_id);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&credential.access_token)
            .json(&json!({ "uris": uris }))
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api(status.as_u16(), body));
        }

        info!(playlist_id = %playlist_id, count = uris.len(), "Added tracks to playlist");
        Ok(())
    }
}
