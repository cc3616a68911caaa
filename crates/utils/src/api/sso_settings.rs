use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use ts_rs::TS;

/// External identity providers whose SSO settings can be edited from the console.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ProviderId {
    Github,
    Google,
    Gitlab,
    Azuread,
    Okta,
}

impl ProviderId {
    pub const ALL: [ProviderId; 5] = [
        ProviderId::Github,
        ProviderId::Google,
        ProviderId::Gitlab,
        ProviderId::Azuread,
        ProviderId::Okta,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Github => "github",
            ProviderId::Google => "google",
            ProviderId::Gitlab => "gitlab",
            ProviderId::Azuread => "azuread",
            ProviderId::Okta => "okta",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown SSO provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderId {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderId::ALL
            .into_iter()
            .find(|provider| provider.as_str() == s)
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

/// Flat settings shape exchanged with the SSO settings endpoint.
///
/// Multi-value fields travel as a single comma-separated string. Keys other
/// than `enabled` are kept as raw JSON so that settings written by other
/// clients still deserialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(flatten)]
    pub values: BTreeMap<String, Value>,
}

impl ProviderSettings {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), Value::String(value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns the value of `name` as a string, or an empty string if absent.
    ///
    /// Arrays of strings are joined with `,`, matching the comma-joined wire
    /// form of multi-value fields.
    pub fn text(&self, name: &str) -> String {
        match self.values.get(name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Some(other) => other.to_string(),
        }
    }
}

/// One provider entry as returned by `GET /api/v1/sso-settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SsoProvider {
    pub provider: String,
    #[ts(type = "Record<string, unknown>")]
    pub settings: ProviderSettings,
}

impl SsoProvider {
    pub fn provider_id(&self) -> Result<ProviderId, UnknownProvider> {
        self.provider.parse()
    }
}

/// Body of `PUT /api/v1/sso-settings/{provider}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateSsoSettingsRequest {
    #[ts(type = "Record<string, unknown>")]
    pub settings: ProviderSettings,
}

/// Structured error payload returned by the settings endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}
