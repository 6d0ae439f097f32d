//! Identity service authentication.
//!
//! Exchanges operator email/password for a JWT via the password grant, and
//! refreshes it with the refresh token. The access token is what
//! [`crate::commerce::CommerceClient`] sends as its bearer token.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::IdentityConfig;
use crate::preferences::{PreferenceError, PreferenceStore};

/// Preference key holding the persisted session.
pub const SESSION_KEY: &str = "commerce.admin.session";

/// Errors that can occur when authenticating.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Token URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Credentials or refresh token rejected.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Session could not be stored or read.
    #[error("Session storage error: {0}")]
    Storage(#[from] PreferenceError),

    /// Stored session is unreadable.
    #[error("Session parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// JWT obtained from the identity service.
#[derive(Debug, Clone)]
pub struct IdentityToken {
    /// Bearer token for commerce API calls.
    pub access_token: SecretString,
    /// Token used to obtain a new access token.
    pub refresh_token: Option<SecretString>,
    /// Unix timestamp when the access token expires.
    pub expires_at: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Token lifetime in seconds.
    expires_in: i64,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Stored form of a session.
#[derive(Serialize, Deserialize)]
struct StoredSession {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_at: i64,
}

/// Client for the identity service token endpoint.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    token_url: Url,
}

impl IdentityClient {
    /// Create a client for the configured identity service.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidUrl` if the token URL cannot be derived.
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let mut base = config.url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            token_url: base.join("token")?,
        })
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::AuthenticationFailed` if the credentials are rejected.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<IdentityToken, IdentityError> {
        let form = [
            ("grant_type", "password"),
            ("username", email),
            ("password", password.expose_secret()),
        ];
        let token = self.request_token(&form).await?;
        tracing::info!("Operator logged in");
        Ok(token)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::AuthenticationFailed` if the refresh token is rejected.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &SecretString) -> Result<IdentityToken, IdentityError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.expose_secret()),
        ];
        self.request_token(&form).await
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<IdentityToken, IdentityError> {
        let now = chrono::Utc::now().timestamp();

        let response = self.client.post(self.token_url.clone()).form(form).send().await?;
        let status = response.status();

        if status.is_success() {
            let body: TokenResponse = response.json().await?;
            return Ok(IdentityToken {
                access_token: SecretString::from(body.access_token),
                refresh_token: body.refresh_token.map(SecretString::from),
                expires_at: now + body.expires_in,
            });
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<TokenErrorResponse>(&text)
            .ok()
            .and_then(|body| body.error_description.or(body.msg).or(body.error))
            .unwrap_or_else(|| format!("HTTP {status}: {text}"));

        Err(IdentityError::AuthenticationFailed(message))
    }
}

impl IdentityToken {
    /// Check if the access token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        // Less than 60 seconds remaining counts as expired
        self.expires_within(60)
    }

    /// Check if the access token will expire within the given number of seconds.
    #[must_use]
    pub fn expires_within(&self, seconds: i64) -> bool {
        let now = chrono::Utc::now().timestamp();
        now >= self.expires_at - seconds
    }

    /// Check if a refresh token is available.
    #[must_use]
    pub const fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Persist the session.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError` if the store cannot be written.
    pub fn save(&self, store: &impl PreferenceStore) -> Result<(), IdentityError> {
        let stored = StoredSession {
            access_token: self.access_token.expose_secret().to_owned(),
            refresh_token: self
                .refresh_token
                .as_ref()
                .map(|t| t.expose_secret().to_owned()),
            expires_at: self.expires_at,
        };
        store.set(SESSION_KEY, &serde_json::to_string(&stored)?)?;
        Ok(())
    }

    /// Load a persisted session, if any.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Parse` if the stored session is unreadable.
    pub fn load(store: &impl PreferenceStore) -> Result<Option<Self>, IdentityError> {
        let Some(text) = store.get(SESSION_KEY) else {
            return Ok(None);
        };
        let stored: StoredSession = serde_json::from_str(&text)?;
        Ok(Some(Self {
            access_token: SecretString::from(stored.access_token),
            refresh_token: stored.refresh_token.map(SecretString::from),
            expires_at: stored.expires_at,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::preferences::MemoryPreferenceStore;

    fn token(expires_in: i64) -> IdentityToken {
        IdentityToken {
            access_token: SecretString::from("jwt"),
            refresh_token: Some(SecretString::from("refresh")),
            expires_at: chrono::Utc::now().timestamp() + expires_in,
        }
    }

    #[test]
    fn test_token_expiry() {
        assert!(!token(3600).is_expired());
        assert!(token(30).is_expired());
        assert!(token(3600).expires_within(7200));
    }

    #[test]
    fn test_session_roundtrip_through_store() {
        let store = MemoryPreferenceStore::new();
        assert!(IdentityToken::load(&store).unwrap().is_none());

        token(3600).save(&store).unwrap();
        let loaded = IdentityToken::load(&store).unwrap().unwrap();
        assert_eq!(loaded.access_token.expose_secret(), "jwt");
        assert!(loaded.can_refresh());
    }

    #[test]
    fn test_token_url_appends_to_path() {
        let config = IdentityConfig {
            url: Url::parse("https://shop.example.com/.netlify/identity").unwrap(),
        };
        let client = IdentityClient::new(&config).unwrap();
        assert_eq!(
            client.token_url.as_str(),
            "https://shop.example.com/.netlify/identity/token"
        );
    }
}
