//! Toolkit connection domain models.
//!
//! Auth configs and connections are owned by the integration platform; these
//! types only carry the ids, statuses and urls observed from it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ToolkitError;

// =============================================================================
// Toolkits
// =============================================================================

/// A third-party service integrable through the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toolkit {
    pub slug: String,
    pub name: String,
    /// Schemes the platform can fully manage (case-insensitive).
    pub managed_auth_schemes: Vec<String>,
    /// Ordered scheme descriptors as reported by the platform.
    pub auth_scheme_details: Vec<AuthSchemeDetail>,
}

/// One supported auth scheme of a toolkit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSchemeDetail {
    /// e.g. `oauth2`, `api_key`, `bearer_token`.
    pub mode: String,
}

impl Toolkit {
    /// Whether the platform can manage credentials for `auth_type` itself.
    pub fn manages(&self, auth_type: &AuthType) -> bool {
        let Some(scheme) = auth_type.scheme_name() else {
            return false;
        };
        // "api_key" and "apikey" name the same scheme.
        let stripped = scheme.to_lowercase().replace('_', "");
        self.managed_auth_schemes
            .iter()
            .any(|s| s.to_lowercase().replace('_', "") == stripped)
    }

    /// Whether the toolkit lists `auth_type` among its scheme descriptors.
    ///
    /// A toolkit without descriptors is treated as accepting any recognized type.
    pub fn supports(&self, auth_type: &AuthType) -> bool {
        if self.auth_scheme_details.is_empty() {
            return auth_type.scheme_name().is_some();
        }
        self.auth_scheme_details
            .iter()
            .any(|d| AuthType::parse(&d.mode) == *auth_type)
    }

    /// Mode of the first scheme descriptor, if any.
    pub fn primary_auth_mode(&self) -> Option<&str> {
        self.auth_scheme_details.first().map(|d| d.mode.as_str())
    }
}

// =============================================================================
// Auth types
// =============================================================================

/// Requested authentication type, normalized from free-form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthType {
    OAuth2,
    ApiKey,
    BearerToken,
    Unsupported(String),
}

impl AuthType {
    /// Normalize: lower-case, strip underscores, then match aliases.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase().replace('_', "");
        match normalized.as_str() {
            "oauth2" | "oauth" => AuthType::OAuth2,
            "apikey" => AuthType::ApiKey,
            "bearertoken" => AuthType::BearerToken,
            _ => AuthType::Unsupported(raw.trim().to_string()),
        }
    }

    /// Canonical platform scheme name.
    pub fn scheme_name(&self) -> Option<&'static str> {
        match self {
            AuthType::OAuth2 => Some("OAUTH2"),
            AuthType::ApiKey => Some("API_KEY"),
            AuthType::BearerToken => Some("BEARER_TOKEN"),
            AuthType::Unsupported(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AuthType::OAuth2 => "oauth2",
            AuthType::ApiKey => "api_key",
            AuthType::BearerToken => "bearer_token",
            AuthType::Unsupported(raw) => raw,
        }
    }

    /// Browser-redirect schemes complete asynchronously.
    pub fn is_redirect(&self) -> bool {
        matches!(self, AuthType::OAuth2)
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Auth configs
// =============================================================================

/// Who owns the credential lifecycle of an auth config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthConfigKind {
    PlatformManaged,
    Custom,
}

/// A persisted credential template bound to one toolkit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    pub id: String,
    pub toolkit_slug: String,
    pub kind: AuthConfigKind,
    pub auth_scheme: Option<String>,
}

/// Body of an auth config creation.
#[derive(Clone)]
pub struct NewAuthConfig {
    pub name: String,
    pub kind: AuthConfigKind,
    pub auth_scheme: Option<&'static str>,
    /// Credential material folded into the config (custom OAuth2 only).
    pub credentials: Option<serde_json::Map<String, serde_json::Value>>,
}

// =============================================================================
// Credentials
// =============================================================================

/// Secret material supplied by the caller for custom or direct-credential auth.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Credentials {
    /// OAuth2 client id and secret, both mandatory.
    pub fn oauth_client(&self) -> Result<(&str, &str), ToolkitError> {
        match (present(&self.client_id), present(&self.client_secret)) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            (id, secret) => {
                let mut fields = Vec::new();
                if id.is_none() {
                    fields.push("clientId");
                }
                if secret.is_none() {
                    fields.push("clientSecret");
                }
                Err(ToolkitError::MissingCredentials { fields })
            }
        }
    }

    /// The secret bound directly at initiation for API-key style schemes.
    ///
    /// Bearer tokens fall back to `apiKey` when `bearerToken` is absent.
    pub fn direct_secret(&self, auth_type: &AuthType) -> Result<&str, ToolkitError> {
        let (secret, field) = match auth_type {
            AuthType::BearerToken => (
                present(&self.bearer_token).or_else(|| present(&self.api_key)),
                "bearerToken",
            ),
            _ => (present(&self.api_key), "apiKey"),
        };
        secret.ok_or(ToolkitError::MissingCredentials {
            fields: vec![field],
        })
    }

    /// Check that everything `auth_type` needs under `kind` is present.
    pub fn require(&self, auth_type: &AuthType, kind: AuthConfigKind) -> Result<(), ToolkitError> {
        match auth_type {
            AuthType::OAuth2 if kind == AuthConfigKind::Custom => self.oauth_client().map(|_| ()),
            AuthType::ApiKey | AuthType::BearerToken => self.direct_secret(auth_type).map(|_| ()),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &present(&self.client_secret).map(|_| "***"))
            .field("api_key", &present(&self.api_key).map(|_| "***"))
            .field("bearer_token", &present(&self.bearer_token).map(|_| "***"))
            .finish()
    }
}

// =============================================================================
// Connections
// =============================================================================

/// Lifecycle state of a connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    PendingRedirect,
    Connecting,
    Active,
    Expired,
    Inactive,
    TimedOut,
    Error,
}

impl ConnectionStatus {
    /// Map a platform status string.
    pub fn from_platform(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "INITIALIZING" | "INITIATED" | "PENDING" | "CONNECTING" => ConnectionStatus::Connecting,
            "ACTIVE" => ConnectionStatus::Active,
            "EXPIRED" => ConnectionStatus::Expired,
            "INACTIVE" | "DISABLED" => ConnectionStatus::Inactive,
            _ => ConnectionStatus::Error,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(
            self,
            ConnectionStatus::PendingRedirect | ConnectionStatus::Connecting
        )
    }

    /// The platform settled the connection without authorizing it.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            ConnectionStatus::Expired | ConnectionStatus::Inactive | ConnectionStatus::Error
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::PendingRedirect => "pending_redirect",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Active => "active",
            ConnectionStatus::Expired => "expired",
            ConnectionStatus::Inactive => "inactive",
            ConnectionStatus::TimedOut => "timed_out",
            ConnectionStatus::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attempt to bind a user identity to an auth config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    pub id: String,
    pub auth_config_id: String,
    pub user_id: String,
    pub status: ConnectionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

/// Connection initiation call.
#[derive(Clone)]
pub struct ConnectionInitiation {
    pub auth_config_id: String,
    pub user_id: String,
    /// Secret material bound directly (API key / bearer token schemes).
    pub data: Option<ConnectionData>,
}

/// Credential values sent with a direct-credential initiation.
#[derive(Clone)]
pub struct ConnectionData {
    pub auth_scheme: &'static str,
    pub values: serde_json::Map<String, serde_json::Value>,
}

/// Platform reply to an initiation.
#[derive(Debug, Clone)]
pub struct InitiatedConnection {
    pub id: String,
    pub status: ConnectionStatus,
    pub redirect_url: Option<String>,
}

// =============================================================================
// Tools
// =============================================================================

/// A platform tool with its JSON-schema input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSchema {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub input_parameters: serde_json::Value,
}

/// Which tools to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolQuery {
    Slugs(Vec<String>),
    Search { query: String, limit: usize },
}

/// Outcome of executing one tool for a user.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolExecution {
    pub successful: bool,
    pub data: serde_json::Value,
    pub error: Option<String>,
}
