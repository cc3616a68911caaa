//! HTTP client for the SSO settings REST endpoints.
//!
//! Calls are made once: there is no retry policy, and a request runs until the
//! transport reports success, failure or its own timeout.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;
use utils::api::sso_settings::{ErrorMessage, ProviderId, SsoProvider, UpdateSsoSettingsRequest};

use super::config::ConsoleConfig;

const SSO_SETTINGS_PATH: &str = "api/v1/sso-settings";

#[derive(Debug, Clone, Error)]
pub enum SsoSettingsClientError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("json error: {0}")]
    Serde(String),
    #[error("url error: {0}")]
    Url(String),
}

impl SsoSettingsClientError {
    /// Message shown to the user when a save fails.
    ///
    /// A structured `{"message": ...}` payload wins; a payload without a
    /// message yields an empty string; anything else falls back to the error
    /// text itself.
    pub fn notification_message(&self) -> String {
        if let Self::Http { body, .. } = self
            && let Ok(payload) = serde_json::from_str::<ErrorMessage>(body)
        {
            return payload.message.unwrap_or_default();
        }
        self.to_string()
    }
}

/// Reads the settings of every provider.
#[async_trait]
pub trait SettingsLister: Send + Sync {
    async fn list(&self) -> Result<Vec<SsoProvider>, SsoSettingsClientError>;
}

/// Writes a provider's settings.
#[async_trait]
pub trait SettingsPersister: Send + Sync {
    async fn persist(
        &self,
        provider: ProviderId,
        request: &UpdateSsoSettingsRequest,
    ) -> Result<(), SsoSettingsClientError>;
}

#[derive(Debug, Clone)]
pub struct SsoSettingsClient {
    base: Url,
    http: Client,
    token: Option<Arc<SecretString>>,
}

impl SsoSettingsClient {
    pub fn new(base_url: &str) -> Result<Self, SsoSettingsClientError> {
        Self::build(base_url, None, Duration::from_secs(10))
    }

    pub fn from_config(config: &ConsoleConfig) -> Result<Self, SsoSettingsClientError> {
        let token = config
            .api_token
            .as_ref()
            .map(|token| SecretString::new(token.expose_secret().into()));
        Self::build(&config.api_base, token, config.http_timeout)
    }

    fn build(
        base_url: &str,
        token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, SsoSettingsClientError> {
        let mut base =
            Url::parse(base_url).map_err(|e| SsoSettingsClientError::Url(e.to_string()))?;
        // Relative joins would otherwise drop the last path segment of the base.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sso-settings-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SsoSettingsClientError::Transport(e.to_string()))?;
        Ok(Self {
            base,
            http,
            token: token.map(Arc::new),
        })
    }

    /// Lists the settings of every configured provider.
    pub async fn list_settings(&self) -> Result<Vec<SsoProvider>, SsoSettingsClientError> {
        self.get_json(SSO_SETTINGS_PATH).await
    }

    /// Fetches one provider's settings.
    pub async fn get_settings(
        &self,
        provider: ProviderId,
    ) -> Result<SsoProvider, SsoSettingsClientError> {
        self.get_json(&format!("{SSO_SETTINGS_PATH}/{provider}"))
            .await
    }

    /// Replaces one provider's settings. The response body is not consumed.
    pub async fn update_settings(
        &self,
        provider: ProviderId,
        request: &UpdateSsoSettingsRequest,
    ) -> Result<(), SsoSettingsClientError> {
        self.put_json(&format!("{SSO_SETTINGS_PATH}/{provider}"), request)
            .await
    }

    fn url(&self, path: &str) -> Result<Url, SsoSettingsClientError> {
        self.base
            .join(path)
            .map_err(|e| SsoSettingsClientError::Url(e.to_string()))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token.expose_secret()),
            None => req,
        }
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, SsoSettingsClientError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = self.url(path)?;
        debug!(%url, "GET");
        let res = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !res.status().is_success() {
            return Err(http_error(res).await);
        }

        res.json::<T>()
            .await
            .map_err(|e| SsoSettingsClientError::Serde(e.to_string()))
    }

    async fn put_json<B>(&self, path: &str, body: &B) -> Result<(), SsoSettingsClientError>
    where
        B: Serialize,
    {
        let url = self.url(path)?;
        debug!(%url, "PUT");
        let res = self
            .authorize(self.http.put(url))
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !res.status().is_success() {
            return Err(http_error(res).await);
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsLister for SsoSettingsClient {
    async fn list(&self) -> Result<Vec<SsoProvider>, SsoSettingsClientError> {
        self.list_settings().await
    }
}

#[async_trait]
impl SettingsPersister for SsoSettingsClient {
    async fn persist(
        &self,
        provider: ProviderId,
        request: &UpdateSsoSettingsRequest,
    ) -> Result<(), SsoSettingsClientError> {
        self.update_settings(provider, request).await
    }
}

async fn http_error(res: Response) -> SsoSettingsClientError {
    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();
    SsoSettingsClientError::Http { status, body }
}

fn map_reqwest_error(e: reqwest::Error) -> SsoSettingsClientError {
    if e.is_timeout() {
        SsoSettingsClientError::Timeout
    } else {
        SsoSettingsClientError::Transport(e.to_string())
    }
}
