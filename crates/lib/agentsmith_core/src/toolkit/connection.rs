//! Connection initiation.
//!
//! OAuth2 connections come back pending a browser redirect; API-key and
//! bearer-token connections bind the secret directly and are active as soon
//! as the platform accepts them. A failed, expired or inactive reply is
//! passed through as is.

use serde_json::{Map, json};
use tracing::{info, warn};

use super::ToolkitError;
use super::models::{
    AuthConfig, AuthConfigKind, AuthType, ConnectionData, ConnectionInitiation, ConnectionRequest,
    ConnectionStatus, Credentials,
};
use super::platform::ToolkitPlatform;
use crate::credential::ApiCredential;

/// Start a connection for `user_id` against `auth_config`.
///
/// Required credentials are checked before the single initiation call, which
/// is not idempotent on the platform and is never retried here.
pub async fn initiate_connection(
    platform: &dyn ToolkitPlatform,
    credential: &ApiCredential,
    auth_config: &AuthConfig,
    user_id: &str,
    auth_type: &AuthType,
    credentials: &Credentials,
) -> Result<ConnectionRequest, ToolkitError> {
    let data = match auth_type {
        AuthType::OAuth2 => {
            if auth_config.kind == AuthConfigKind::Custom {
                credentials.oauth_client()?;
            }
            None
        }
        AuthType::ApiKey | AuthType::BearerToken => {
            let secret = credentials.direct_secret(auth_type)?;
            let field = if *auth_type == AuthType::BearerToken {
                "token"
            } else {
                "api_key"
            };
            let mut values = Map::new();
            values.insert(field.into(), json!(secret));
            Some(ConnectionData {
                auth_scheme: auth_type.scheme_name().unwrap_or("API_KEY"),
                values,
            })
        }
        AuthType::Unsupported(raw) => {
            return Err(ToolkitError::UnsupportedAuthType {
                toolkit_name: auth_config.toolkit_slug.clone(),
                auth_type: raw.clone(),
                dashboard_url: platform.dashboard_url(&auth_config.toolkit_slug),
            });
        }
    };

    let initiation = ConnectionInitiation {
        auth_config_id: auth_config.id.clone(),
        user_id: user_id.to_string(),
        data,
    };
    let reply = platform.initiate_connection(credential, &initiation).await?;

    let request = if auth_type.is_redirect() {
        let redirect_url = reply.redirect_url.filter(|u| !u.is_empty()).ok_or_else(|| {
            ToolkitError::InvalidResponse(format!(
                "connection {} has no redirect URL",
                reply.id
            ))
        })?;
        ConnectionRequest {
            id: reply.id,
            auth_config_id: auth_config.id.clone(),
            user_id: user_id.to_string(),
            status: ConnectionStatus::PendingRedirect,
            redirect_url: Some(redirect_url),
        }
    } else {
        let status = if reply.status.is_failure() {
            warn!(
                connection_id = %reply.id,
                status = %reply.status,
                "platform rejected credentials"
            );
            reply.status
        } else {
            ConnectionStatus::Active
        };
        ConnectionRequest {
            id: reply.id,
            auth_config_id: auth_config.id.clone(),
            user_id: user_id.to_string(),
            status,
            redirect_url: None,
        }
    };

    info!(
        toolkit = %auth_config.toolkit_slug,
        connection_id = %request.id,
        status = %request.status,
        "connection initiated"
    );
    Ok(request)
}
