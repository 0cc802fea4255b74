//! Auth collaborator client
//!
//! Every entry point forwards its bearer token here before doing
//! anything else. The collaborator validates it, refreshing expired
//! tokens transparently, and returns the credential to use downstream.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::Credential;
use crate::types::AuthVerifier;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Credential verification errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Collaborator unreachable
    #[error("Network error: {0}")]
    Network(String),

    /// Collaborator rejected the token
    #[error("Authentication rejected: {0}")]
    Rejected(String),

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    access_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: String,
    caller_id: String,
    #[serde(default)]
    refreshed: bool,
}

/// HTTP client for the auth collaborator
pub struct AuthClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: &str) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AuthError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AuthVerifier for AuthClient {
    async fn authenticate(&self, access_token: &str) -> Result<Credential, AuthError> {
        let url = format!("{}/v1/authenticate", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .json(&AuthRequest { access_token })
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected(format!("{}: {}", status.as_u16(), body)));
        }

        let parsed: AuthResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Parse(e.to_string()))?;

        if parsed.refreshed {
            debug!(caller_id = %parsed.caller_id, "Access token was refreshed upstream");
        }

        Ok(Credential {
            access_token: parsed.access_token,
            caller_id: parsed.caller_id,
        })
    }
}
