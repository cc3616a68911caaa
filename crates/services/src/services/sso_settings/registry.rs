//! Static field registry: which fields each provider form shows, and how
//! each field is labelled, rendered and validated.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utils::api::sso_settings::{ProviderId, UnknownProvider};

pub const REQUIRED_MESSAGE: &str = "This field is required";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error(transparent)]
    UnknownProvider(#[from] UnknownProvider),
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("unknown field kind: {0}")]
    UnknownFieldKind(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum FieldKind {
    Text,
    MultiSelect,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => f.write_str("text"),
            FieldKind::MultiSelect => f.write_str("multiselect"),
        }
    }
}

impl FromStr for FieldKind {
    type Err = RegistryError;

    /// Accepts the console's input type names; `select` is always multi-valued here.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(FieldKind::Text),
            "select" | "multiselect" => Ok(FieldKind::MultiSelect),
            other => Err(RegistryError::UnknownFieldKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub placeholder: Option<&'static str>,
    pub validation_message: Option<&'static str>,
    pub allow_custom_value: bool,
}

const fn text(name: &'static str, label: &'static str, required: bool) -> FieldDescriptor {
    FieldDescriptor {
        name,
        label,
        kind: FieldKind::Text,
        required,
        placeholder: None,
        validation_message: if required {
            Some(REQUIRED_MESSAGE)
        } else {
            None
        },
        allow_custom_value: false,
    }
}

const fn multi_select(
    name: &'static str,
    label: &'static str,
    placeholder: Option<&'static str>,
) -> FieldDescriptor {
    FieldDescriptor {
        name,
        label,
        kind: FieldKind::MultiSelect,
        required: false,
        placeholder,
        validation_message: None,
        allow_custom_value: true,
    }
}

static CLIENT_ID: FieldDescriptor = text("clientId", "Client Id", true);
static CLIENT_SECRET: FieldDescriptor = text("clientSecret", "Client Secret", true);
static TEAM_IDS: FieldDescriptor = multi_select(
    "teamIds",
    "Team Ids",
    Some("Enter team IDs and press Enter to add"),
);
static ALLOWED_ORGANIZATIONS: FieldDescriptor = multi_select(
    "allowedOrganizations",
    "Allowed Organizations",
    Some("Enter organizations (my-team, myteam...) and press Enter to add"),
);
static ALLOWED_DOMAINS: FieldDescriptor = multi_select("allowedDomains", "Allowed Domains", None);
static AUTH_URL: FieldDescriptor = text("authUrl", "Auth Url", false);
static TOKEN_URL: FieldDescriptor = text("tokenUrl", "Token Url", false);
static SCOPES: FieldDescriptor = multi_select("scopes", "Scopes", None);
static ALLOWED_GROUPS: FieldDescriptor = multi_select("allowedGroups", "Allowed Groups", None);
static API_URL: FieldDescriptor = text("apiUrl", "API Url", false);
static ROLE_ATTRIBUTE_PATH: FieldDescriptor =
    text("roleAttributePath", "Role Attribute Path", false);

/// Ordered field names shown on a provider's form.
pub fn fields_for(provider: ProviderId) -> &'static [&'static str] {
    match provider {
        ProviderId::Github => &["clientId", "clientSecret", "teamIds", "allowedOrganizations"],
        ProviderId::Google => &["clientId", "clientSecret", "allowedDomains"],
        ProviderId::Gitlab => &["clientId", "clientSecret", "allowedOrganizations", "teamIds"],
        ProviderId::Azuread => &[
            "clientId",
            "clientSecret",
            "authUrl",
            "tokenUrl",
            "scopes",
            "allowedGroups",
            "allowedDomains",
        ],
        ProviderId::Okta => &[
            "clientId",
            "clientSecret",
            "authUrl",
            "tokenUrl",
            "apiUrl",
            "roleAttributePath",
            "allowedGroups",
            "allowedDomains",
        ],
    }
}

/// Same as [`fields_for`], for a provider name that has not been parsed yet.
pub fn fields_for_name(provider: &str) -> Result<&'static [&'static str], RegistryError> {
    let provider: ProviderId = provider.parse()?;
    Ok(fields_for(provider))
}

pub fn describe(name: &str) -> Result<&'static FieldDescriptor, RegistryError> {
    let descriptor = match name {
        "clientId" => &CLIENT_ID,
        "clientSecret" => &CLIENT_SECRET,
        "teamIds" => &TEAM_IDS,
        "allowedOrganizations" => &ALLOWED_ORGANIZATIONS,
        "allowedDomains" => &ALLOWED_DOMAINS,
        "authUrl" => &AUTH_URL,
        "tokenUrl" => &TOKEN_URL,
        "scopes" => &SCOPES,
        "allowedGroups" => &ALLOWED_GROUPS,
        "apiUrl" => &API_URL,
        "roleAttributePath" => &ROLE_ATTRIBUTE_PATH,
        _ => return Err(RegistryError::UnknownField(name.to_string())),
    };
    Ok(descriptor)
}

/// Resolves every field of a provider's form, failing on the first name
/// missing from the descriptor table.
pub fn descriptors_for(
    provider: ProviderId,
) -> Result<Vec<&'static FieldDescriptor>, RegistryError> {
    fields_for(provider).iter().map(|name| describe(name)).collect()
}

/// Page chrome shown above a provider's form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderPage {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub icon: &'static str,
}

pub fn page_for(provider: ProviderId) -> ProviderPage {
    match provider {
        ProviderId::Github => ProviderPage {
            title: "GitHub",
            subtitle: "To configure GitHub OAuth2 you must register your application with GitHub. \
                       GitHub will generate a Client ID and Client Secret for you to use.",
            icon: "github",
        },
        ProviderId::Google => ProviderPage {
            title: "Google",
            subtitle: "To configure Google OAuth2 you must create OAuth credentials in the Google \
                       Cloud console and copy the Client ID and Client Secret here.",
            icon: "google",
        },
        ProviderId::Gitlab => ProviderPage {
            title: "GitLab",
            subtitle: "To configure GitLab OAuth2 you must register an application in GitLab and \
                       copy its Application ID and Secret here.",
            icon: "gitlab",
        },
        ProviderId::Azuread => ProviderPage {
            title: "Azure AD",
            subtitle: "To configure Azure AD OAuth2 you must register your application in the \
                       Azure portal and copy its client credentials and endpoints here.",
            icon: "microsoft",
        },
        ProviderId::Okta => ProviderPage {
            title: "Okta",
            subtitle: "To configure Okta OAuth2 you must create an OIDC application in Okta and \
                       copy its client credentials and endpoints here.",
            icon: "okta",
        },
    }
}
