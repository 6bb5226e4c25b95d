//! Access tokens for the storage API
//!
//! Either a fixed bearer token from the environment, or an authorized-user
//! token file whose refresh token is exchanged for short-lived access tokens.

use crate::ai::credentials::CredentialError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Environment variable holding a ready-made access token
pub const ACCESS_TOKEN_ENV: &str = "DRIVE_ACCESS_TOKEN";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are refreshed early
const EXPIRY_MARGIN_SECS: i64 = 60;

#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, CredentialError>;
}

/// A token that never changes for the life of the run
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Token from [`ACCESS_TOKEN_ENV`], if set and non-empty
    pub fn from_env() -> Option<Self> {
        std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(Self)
    }
}

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, CredentialError> {
        Ok(self.0.clone())
    }
}

/// Authorized-user token file as written by the usual OAuth consent tools
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizedUser {
    #[serde(default)]
    pub token: Option<String>,
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl AuthorizedUser {
    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        let text = fs::read_to_string(path).map_err(|source| CredentialError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CredentialError::MalformedTokenFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > now
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Exchanges the refresh token for access tokens on demand
pub struct RefreshTokenProvider {
    client: Client,
    user: AuthorizedUser,
    source: PathBuf,
    cached: Mutex<Option<CachedToken>>,
}

impl RefreshTokenProvider {
    pub fn from_file(client: Client, path: &Path) -> Result<Self, CredentialError> {
        let user = AuthorizedUser::load(path)?;
        Ok(Self::new(client, user, path.to_path_buf()))
    }

    pub fn new(client: Client, user: AuthorizedUser, source: PathBuf) -> Self {
        // A still-valid token from the file saves one refresh round trip
        let cached = match (&user.token, user.expiry) {
            (Some(value), Some(expires_at)) => Some(CachedToken {
                value: value.clone(),
                expires_at,
            }),
            _ => None,
        };
        Self {
            client,
            user,
            source,
            cached: Mutex::new(cached),
        }
    }

    async fn refresh(&self) -> Result<CachedToken, CredentialError> {
        let token_uri = self.user.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);
        tracing::debug!("Refreshing access token from {:?}", self.source);

        let response = self
            .client
            .post(token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.user.refresh_token.as_str()),
                ("client_id", self.user.client_id.as_str()),
                ("client_secret", self.user.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| CredentialError::RefreshFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::RefreshFailed(format!("{}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::RefreshFailed(e.to_string()))?;

        Ok(CachedToken {
            value: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in.unwrap_or(3600)),
        })
    }
}

#[async_trait]
impl AccessTokenProvider for RefreshTokenProvider {
    async fn access_token(&self) -> Result<String, CredentialError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.value.clone());
        }

        let token = self.refresh().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_static_token() {
        let provider = StaticToken::new("abc");
        assert_eq!(provider.access_token().await.unwrap(), "abc");
    }

    #[test]
    fn test_load_authorized_user_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token_full_drive.json");
        fs::write(
            &path,
            r#"{"token": "ya29.x", "refresh_token": "1//r", "client_id": "cid",
                "client_secret": "sec", "token_uri": "https://oauth2.googleapis.com/token",
                "scopes": ["https://www.googleapis.com/auth/drive"],
                "expiry": "2030-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        let user = AuthorizedUser::load(&path).unwrap();
        assert_eq!(user.refresh_token, "1//r");
        assert_eq!(user.token.as_deref(), Some("ya29.x"));
        assert!(user.expiry.is_some());
    }

    #[test]
    fn test_malformed_token_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, r#"{"token": "only"}"#).unwrap();

        assert!(matches!(
            AuthorizedUser::load(&path),
            Err(CredentialError::MalformedTokenFile { .. })
        ));
        assert!(matches!(
            AuthorizedUser::load(&dir.path().join("missing.json")),
            Err(CredentialError::Read { .. })
        ));
    }

    #[tokio::test]
    async fn test_unexpired_file_token_is_used_without_refresh() {
        let user = AuthorizedUser {
            token: Some("cached-token".to_string()),
            refresh_token: "r".to_string(),
            client_id: "c".to_string(),
            client_secret: "s".to_string(),
            // Unroutable so any refresh attempt would fail
            token_uri: Some("http://127.0.0.1:9/token".to_string()),
            expiry: Some(Utc::now() + Duration::hours(1)),
        };
        let provider = RefreshTokenProvider::new(Client::new(), user, PathBuf::from("token.json"));
        assert_eq!(provider.access_token().await.unwrap(), "cached-token");
    }

    #[test]
    fn test_expiry_margin() {
        let now = Utc::now();
        let soon = CachedToken {
            value: "t".to_string(),
            expires_at: now + Duration::seconds(30),
        };
        let later = CachedToken {
            value: "t".to_string(),
            expires_at: now + Duration::seconds(600),
        };
        assert!(!soon.is_fresh(now));
        assert!(later.is_fresh(now));
    }
}
