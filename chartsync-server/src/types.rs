//! Collaborator seams
//!
//! The pipeline engines talk to external services through these traits
//! so tests can substitute scripted implementations. The HTTP clients in
//! [`crate::services`] are the production implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::Credential;
use crate::services::auth_client::AuthError;
use crate::services::catalog_client::CatalogError;

/// Best catalog match for a (title, artist) query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMatch {
    pub uri: String,
    pub title: String,
    pub artist: String,
    pub popularity: i64,
}

/// Catalog operations the pipeline depends on
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Look up the best track match for a (title, artist) pair.
    ///
    /// `Ok(None)` means the catalog responded but had no match; `Err`
    /// means the lookup itself failed. The resolution engine treats both
    /// as a miss and falls back to the alias cache.
    async fn search(
        &self,
        title: &str,
        artist: &str,
        credential: &Credential,
    ) -> Result<Option<TrackMatch>, CatalogError>;

    /// Append track URIs to a playlist, preserving slice order
    async fn add_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
        credential: &Credential,
    ) -> Result<(), CatalogError>;
}

/// Credential verification every entry point runs before touching state
#[async_trait]
pub trait AuthVerifier: Send + Sync {
    /// Exchange a raw bearer token for a validated credential.
    ///
    /// The collaborator may transparently refresh the token; the
    /// credential carries the token to use downstream, which is not
    /// necessarily the one presented.
    async fn authenticate(&self, access_token: &str) -> Result<Credential, AuthError>;
}
