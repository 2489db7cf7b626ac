//! End-to-end connection flow: fetch → classify → resolve → initiate.

use serde::Serialize;
use tracing::info;

use super::models::{AuthConfig, AuthType, ConnectionRequest, Credentials, Toolkit};
use super::platform::ToolkitPlatform;
use super::{ToolkitError, connection, fetch_toolkit, resolver};
use crate::credential::ApiCredential;

/// Input to [`connect_toolkit`].
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    pub toolkit_slug: String,
    /// Free-form auth type as typed by the user (`oauth`, `API_KEY`, ...).
    pub auth_type: String,
    pub user_id: String,
    pub credentials: Credentials,
    /// Use caller-owned credentials even when the platform could manage them.
    pub custom_auth: bool,
}

/// Everything the caller needs to finish or display a connection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOutcome {
    pub toolkit: Toolkit,
    #[serde(skip)]
    pub auth_type: AuthType,
    pub auth_config: AuthConfig,
    pub connection: ConnectionRequest,
}

impl ConnectOutcome {
    /// Redirect-based connections still need [`super::waiter::wait_for_connection`].
    pub fn needs_wait(&self) -> bool {
        self.connection.redirect_url.is_some()
    }
}

/// Run the connection negotiation for one toolkit.
///
/// Missing credentials are reported right after the metadata lookup, before
/// any auth config or connection call.
pub async fn connect_toolkit(
    platform: &dyn ToolkitPlatform,
    credential: &ApiCredential,
    request: &ConnectRequest,
) -> Result<ConnectOutcome, ToolkitError> {
    let toolkit = fetch_toolkit(platform, credential, &request.toolkit_slug).await?;
    let classification =
        resolver::classify(platform, &toolkit, &request.auth_type, request.custom_auth)?;
    request
        .credentials
        .require(&classification.auth_type, classification.kind)?;

    let auth_config = resolver::resolve_auth_config(
        platform,
        credential,
        &toolkit,
        &classification,
        &request.credentials,
    )
    .await?;

    let connection = connection::initiate_connection(
        platform,
        credential,
        &auth_config,
        &request.user_id,
        &classification.auth_type,
        &request.credentials,
    )
    .await?;

    info!(
        toolkit = %toolkit.slug,
        auth_type = %classification.auth_type,
        kind = ?classification.kind,
        status = %connection.status,
        "toolkit connection negotiated"
    );

    Ok(ConnectOutcome {
        toolkit,
        auth_type: classification.auth_type,
        auth_config,
        connection,
    })
}
