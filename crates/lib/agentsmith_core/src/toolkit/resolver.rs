//! Auth config resolution.
//!
//! Classifies a requested auth type against a toolkit, then reuses an
//! existing auth config of the same kind or creates one.
//!
//! The list-then-create sequence is not atomic on the platform: two
//! concurrent resolutions for the same toolkit and kind can both miss and
//! both create. De-duplication is best-effort.

use serde_json::{Map, json};
use tracing::{debug, info};

use super::ToolkitError;
use super::models::{AuthConfig, AuthConfigKind, AuthType, Credentials, NewAuthConfig, Toolkit};
use super::platform::ToolkitPlatform;
use crate::credential::ApiCredential;

/// A requested auth type paired with who will own its credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthClassification {
    pub auth_type: AuthType,
    pub kind: AuthConfigKind,
}

/// Decide between platform-managed and custom auth for `toolkit`.
///
/// Platform-managed wins unless the caller explicitly asked for the custom
/// path. A type the platform cannot manage is only accepted on the custom
/// path, and only when the toolkit supports it at all.
pub fn classify(
    platform: &dyn ToolkitPlatform,
    toolkit: &Toolkit,
    raw_auth_type: &str,
    custom_requested: bool,
) -> Result<AuthClassification, ToolkitError> {
    let auth_type = AuthType::parse(raw_auth_type);

    let kind = match &auth_type {
        AuthType::Unsupported(_) => None,
        t if custom_requested && toolkit.supports(t) => Some(AuthConfigKind::Custom),
        t if !custom_requested && toolkit.manages(t) => Some(AuthConfigKind::PlatformManaged),
        _ => None,
    };

    match kind {
        Some(kind) => Ok(AuthClassification { auth_type, kind }),
        None => Err(ToolkitError::UnsupportedAuthType {
            toolkit_name: toolkit.name.clone(),
            auth_type: auth_type.to_string(),
            dashboard_url: platform.dashboard_url(&toolkit.slug),
        }),
    }
}

fn reusable(config: &AuthConfig, toolkit: &Toolkit, classification: &AuthClassification) -> bool {
    let scheme_matches = match (&config.auth_scheme, classification.auth_type.scheme_name()) {
        (Some(listed), Some(wanted)) => listed.eq_ignore_ascii_case(wanted),
        _ => true,
    };
    config.toolkit_slug.eq_ignore_ascii_case(&toolkit.slug)
        && config.kind == classification.kind
        && scheme_matches
}

fn draft(
    toolkit: &Toolkit,
    classification: &AuthClassification,
    credentials: &Credentials,
) -> Result<NewAuthConfig, ToolkitError> {
    let label = match classification.auth_type {
        AuthType::OAuth2 => "OAuth",
        AuthType::BearerToken => "Bearer Token",
        _ => "API Key",
    };
    let name = format!("{} {} Config", toolkit.name, label);

    Ok(match classification.kind {
        AuthConfigKind::PlatformManaged => NewAuthConfig {
            name,
            kind: AuthConfigKind::PlatformManaged,
            auth_scheme: None,
            credentials: None,
        },
        AuthConfigKind::Custom => {
            // OAuth client secrets belong to the config; direct secrets are
            // bound at initiation instead.
            let credentials = match classification.auth_type {
                AuthType::OAuth2 => {
                    let (client_id, client_secret) = credentials.oauth_client()?;
                    let mut map = Map::new();
                    map.insert("client_id".into(), json!(client_id));
                    map.insert("client_secret".into(), json!(client_secret));
                    Some(map)
                }
                _ => None,
            };
            NewAuthConfig {
                name,
                kind: AuthConfigKind::Custom,
                auth_scheme: classification.auth_type.scheme_name(),
                credentials,
            }
        }
    })
}

/// Return the canonical auth config for `toolkit` under `classification`,
/// creating it when none exists yet.
///
/// Sequential calls with no other writer converge on one config id.
pub async fn resolve_auth_config(
    platform: &dyn ToolkitPlatform,
    credential: &ApiCredential,
    toolkit: &Toolkit,
    classification: &AuthClassification,
    credentials: &Credentials,
) -> Result<AuthConfig, ToolkitError> {
    // Validate before any network traffic.
    let new_config = draft(toolkit, classification, credentials)?;

    let existing = platform.list_auth_configs(credential, &toolkit.slug).await?;
    if let Some(found) = existing
        .into_iter()
        .find(|c| reusable(c, toolkit, classification))
    {
        debug!(
            toolkit = %toolkit.slug,
            auth_config_id = %found.id,
            kind = ?found.kind,
            "reusing auth config"
        );
        return Ok(found);
    }

    let created = platform
        .create_auth_config(credential, &toolkit.slug, &new_config)
        .await?;
    info!(
        toolkit = %toolkit.slug,
        auth_config_id = %created.id,
        kind = ?created.kind,
        "created auth config"
    );
    Ok(created)
}
