//! Client configuration.
//!
//! A small JSON file tells the client where the sync server lives; every
//! endpoint (auth, push, pull) is derived from the one base URL.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::{is_http_url, normalize_text_option};

const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Runtime configuration for the sync client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Build a validated config from a raw server URL.
    pub fn with_server_url(url: impl Into<String>) -> Result<Self, String> {
        let url = normalize_text_option(Some(url.into()))
            .ok_or_else(|| "server URL must not be empty".to_string())?;
        if !is_http_url(&url) {
            return Err("server URL must include http:// or https://".to_string());
        }
        Ok(Self {
            server_url: url.trim_end_matches('/').to_string(),
            ..Self::default()
        })
    }

    /// Parse a config from a raw JSON payload, validating the URL.
    pub fn parse(payload: &str) -> Result<Self, String> {
        let config: Self = serde_json::from_str(payload)
            .map_err(|error| format!("invalid client config JSON: {error}"))?;
        let validated = Self::with_server_url(config.server_url)?;
        Ok(Self {
            server_url: validated.server_url,
            request_timeout_secs: config.request_timeout_secs,
        })
    }

    /// The per-request network timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
