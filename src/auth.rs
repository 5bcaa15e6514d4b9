//! Saved OAuth credentials and session refresh.
//!
//! The interactive consent flow is out of scope: a `token.json` in the
//! `authorized_user` shape (client id/secret + refresh token) must
//! already exist. This module exchanges the refresh token for a bearer
//! access token and tracks its expiry so the poller can renew it
//! between cycles.

use std::path::Path;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::error::AuthError;

/// Google OAuth token endpoint.
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Renew the session this long before the access token actually expires.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Contents of `token.json` (Google's `authorized_user` format).
#[derive(Debug, Clone, Deserialize)]
pub struct SavedCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
    pub refresh_token: SecretString,
}

impl SavedCredentials {
    /// Load credentials from a `token.json` file.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let raw = std::fs::read_to_string(path).map_err(|e| AuthError::TokenFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// An authenticated mailbox session: a bearer token plus its expiry.
#[derive(Debug, Clone)]
pub struct Session {
    access_token: SecretString,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Build a session from a raw bearer token with no known expiry.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(token.into()),
            expires_at: None,
        }
    }

    /// Bearer token for the Authorization header.
    pub fn bearer(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Whether the token is expired or within the renewal skew.
    ///
    /// Sessions with unknown expiry are never considered expired.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Utc::now() + chrono::Duration::seconds(EXPIRY_SKEW_SECS) >= at,
            None => false,
        }
    }
}

/// Successful response from the token endpoint.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Exchange the refresh token for a fresh access token.
pub async fn refresh_session(
    http: &reqwest::Client,
    creds: &SavedCredentials,
) -> Result<Session, AuthError> {
    let params = [
        ("grant_type", "refresh_token"),
        ("client_id", creds.client_id.as_str()),
        ("client_secret", creds.client_secret.expose_secret()),
        ("refresh_token", creds.refresh_token.expose_secret()),
    ];

    let response = http
        .post(TOKEN_URL)
        .form(&params)
        .send()
        .await
        .map_err(|e| AuthError::RefreshFailed {
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::RefreshFailed {
            reason: format!("{status}: {body}"),
        });
    }

    let tokens: RefreshResponse =
        response.json().await.map_err(|e| AuthError::RefreshFailed {
            reason: format!("invalid token response: {e}"),
        })?;

    let expires_at = tokens
        .expires_in
        .map(|secs| Utc::now() + chrono::Duration::seconds(secs));
    debug!(?expires_at, "Refreshed access token");

    Ok(Session {
        access_token: SecretString::from(tokens.access_token),
        expires_at,
    })
}
