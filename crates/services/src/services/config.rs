use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::SecretString;

pub const DEFAULT_API_BASE: &str = "http://localhost:3000/";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Settings client configuration sourced from environment variables.
#[derive(Debug)]
pub struct ConsoleConfig {
    pub api_base: String,
    pub api_token: Option<SecretString>,
    pub http_timeout: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_token: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_base =
            lookup("SSO_SETTINGS_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_token = lookup("SSO_SETTINGS_API_TOKEN")
            .filter(|token| !token.is_empty())
            .map(|token| SecretString::new(token.into()));
        let http_timeout = match lookup("SSO_SETTINGS_HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse()
                    .with_context(|| format!("parse SSO_SETTINGS_HTTP_TIMEOUT_SECS: {raw}"))?,
            ),
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };
        Ok(Self {
            api_base,
            api_token,
            http_timeout,
        })
    }
}
