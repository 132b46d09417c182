//! Auth client and session handling for the sync server.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::{compact_text, is_http_url, normalize_text_option};

const EXPIRY_SKEW_SECONDS: i64 = 60;

/// The server issues bearer tokens without an expiry; sessions are treated
/// as valid for this many days client-side.
const SESSION_LIFETIME_DAYS: i64 = 30;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub email: String,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now() + chrono::Duration::seconds(EXPIRY_SKEW_SECONDS)
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("email", &self.email)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Session storage error: {0}")]
    SessionStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Where a session lives between runs (file, keychain, test stub).
pub trait SessionPersistence {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// What the sync engine consumes: a valid, non-expired bearer token.
pub trait TokenSource {
    fn valid_token(&self) -> Option<String>;
}

/// [`TokenSource`] over any session store, checking expiry on every read.
pub struct StoredTokenSource<S: SessionPersistence> {
    store: S,
}

impl<S: SessionPersistence> StoredTokenSource<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: SessionPersistence> TokenSource for StoredTokenSource<S> {
    fn valid_token(&self) -> Option<String> {
        match self.store.load_session() {
            Ok(Some(session)) if !session.is_expired() => Some(session.access_token),
            Ok(Some(_)) => {
                tracing::warn!("Stored session has expired");
                None
            }
            Ok(None) => None,
            Err(error) => {
                tracing::warn!("Failed to load stored session: {error}");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    error: Option<String>,
    message: Option<String>,
    detail: Option<serde_json::Value>,
}

/// HTTP client for the server's `/auth` endpoints.
#[derive(Clone)]
pub struct AuthClient {
    base_url: String,
    client: reqwest::Client,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AuthResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        Ok(Self {
            base_url,
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    /// Exchange credentials for a bearer token session.
    ///
    /// The login endpoint takes OAuth2-style form fields (`username`,
    /// `password`); registration takes a JSON body. Both return
    /// `{access_token, token_type}`.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        validate_credentials(email, password)?;

        let response = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .form(&[("username", email), ("password", password)])
            .send()
            .await?;

        self.into_session(response, email).await
    }

    /// Register a new account; the server signs the user in immediately.
    pub async fn register(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        let response = self
            .client
            .post(format!("{}/auth/register", self.base_url))
            .json(&payload)
            .send()
            .await?;

        self.into_session(response, email).await
    }

    async fn into_session(
        &self,
        response: reqwest::Response,
        email: &str,
    ) -> AuthResult<AuthSession> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }

        let payload = response.json::<TokenResponse>().await?;
        let access_token = payload.access_token.trim().to_string();
        if access_token.is_empty() {
            return Err(AuthError::Api(
                "response did not include an access token".to_string(),
            ));
        }

        Ok(AuthSession {
            access_token,
            expires_at: Utc::now() + chrono::Duration::days(SESSION_LIFETIME_DAYS),
            email: email.to_string(),
        })
    }
}

fn validate_credentials(email: &str, password: &str) -> AuthResult<()> {
    if email.trim().is_empty() {
        return Err(AuthError::Api("Email is required".to_string()));
    }
    if password.trim().is_empty() {
        return Err(AuthError::Api("Password is required".to_string()));
    }
    Ok(())
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<AuthErrorBody>(body) {
        let detail = payload.detail.map(|value| match value {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        });
        if let Some(message) = payload.message.or(payload.error).or(detail) {
            return format!("{} ({})", compact_text(&message), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact_text(trimmed), status.as_u16())
    }
}

fn normalize_base_url(raw: String) -> AuthResult<String> {
    let url = normalize_text_option(Some(raw)).ok_or_else(|| {
        AuthError::InvalidConfiguration("server URL must not be empty".to_string())
    })?;
    if is_http_url(&url) {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(AuthError::InvalidConfiguration(
            "server URL must include http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MemorySessionStore(std::sync::Mutex<Option<AuthSession>>);

    impl SessionPersistence for &MemorySessionStore {
        fn load_session(&self) -> AuthResult<Option<AuthSession>> {
            Ok(self.0.lock().unwrap().clone())
        }
        fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
            *self.0.lock().unwrap() = Some(session.clone());
            Ok(())
        }
        fn clear_session(&self) -> AuthResult<()> {
            *self.0.lock().unwrap() = None;
            Ok(())
        }
    }

    fn session(expires_at: DateTime<Utc>) -> AuthSession {
        AuthSession {
            access_token: "secret-token".to_string(),
            expires_at,
            email: "user@example.com".to_string(),
        }
    }

    #[test]
    fn normalize_base_url_rejects_invalid_values() {
        assert!(normalize_base_url(String::new()).is_err());
        assert!(normalize_base_url("api.example.com".to_string()).is_err());
    }

    #[test]
    fn session_debug_redacts_token() {
        let rendered = format!("{:?}", session(Utc::now()));
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn stored_token_source_checks_expiry() {
        let store = MemorySessionStore(std::sync::Mutex::new(None));
        let source = StoredTokenSource::new(&store);
        assert_eq!(source.valid_token(), None);

        (&store)
            .save_session(&session(Utc::now() + chrono::Duration::days(1)))
            .unwrap();
        assert_eq!(source.valid_token(), Some("secret-token".to_string()));

        (&store)
            .save_session(&session(Utc::now() - chrono::Duration::days(1)))
            .unwrap();
        assert_eq!(source.valid_token(), None);
    }

    #[test]
    fn expiry_honors_skew() {
        assert!(session(Utc::now() + chrono::Duration::seconds(30)).is_expired());
        assert!(!session(Utc::now() + chrono::Duration::seconds(120)).is_expired());
    }
}
