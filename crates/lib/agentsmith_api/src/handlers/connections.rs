//! Toolkit connection routes.

use std::collections::HashMap;
use std::time::Duration;

use agentsmith_core::toolkit::flow::{ConnectRequest, connect_toolkit};
use agentsmith_core::toolkit::models::Toolkit;
use agentsmith_core::toolkit::naming::{distinct_toolkit_slugs, extract_toolkit_slug};
use agentsmith_core::toolkit::waiter::{WaitOptions, wait_for_connection};
use agentsmith_core::toolkit::{ToolkitError, fetch_toolkit};
use axum::Json;
use axum::extract::{Query, State};
use futures::future::join_all;
use tracing::{debug, info};

use super::{credential, required};
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{
    ConnectAppsRequest, ConnectAppsResponse, ConnectionStatusQuery, ConnectionStatusResponse,
    CreateConnectionRequest, CreateConnectionResponse, RequiredApp, WaitForConnectionRequest,
};

const DEFAULT_USER_ID: &str = "default";

/// `POST /api/create-connection`
pub async fn create_connection_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateConnectionRequest>,
) -> AppResult<Json<CreateConnectionResponse>> {
    let key = credential(body.platform_api_key.as_deref(), None, "Missing required fields")?;
    let toolkit_slug = required(body.toolkit_slug, "Missing required fields")?;
    let auth_type = required(body.auth_type, "Missing required fields")?;

    let request = ConnectRequest {
        toolkit_slug,
        auth_type,
        user_id: body
            .user_id
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
        credentials: body.credentials,
        custom_auth: body.custom_auth,
    };
    let outcome = connect_toolkit(&*state.platform, &key, &request).await?;

    let failed = outcome.connection.status.is_failure();
    let message = if outcome.needs_wait() {
        format!(
            "{} connection initiated. Please complete authorization.",
            outcome.toolkit.name
        )
    } else if failed {
        format!(
            "{} connection was not accepted ({})",
            outcome.toolkit.name, outcome.connection.status
        )
    } else {
        format!(
            "{} connected successfully with {}",
            outcome.toolkit.name, outcome.auth_type
        )
    };
    Ok(Json(CreateConnectionResponse {
        success: !failed,
        auth_type: outcome.auth_type.to_string(),
        toolkit_slug: outcome.toolkit.slug,
        toolkit_name: outcome.toolkit.name,
        auth_config_id: outcome.auth_config.id,
        connection_id: outcome.connection.id,
        status: outcome.connection.status,
        redirect_url: outcome.connection.redirect_url,
        message,
    }))
}

/// `GET /api/connection-status?connectionId=&platformApiKey=`
pub async fn connection_status_handler(
    State(state): State<AppState>,
    Query(query): Query<ConnectionStatusQuery>,
) -> AppResult<Json<ConnectionStatusResponse>> {
    let connection_id = required(query.connection_id, "Missing required parameters")?;
    let key = credential(
        query.platform_api_key.as_deref(),
        None,
        "Missing required parameters",
    )?;

    let status = state.platform.connection_status(&key, &connection_id).await?;
    Ok(Json(ConnectionStatusResponse {
        terminal: status.is_terminal(),
        connection_id,
        status,
    }))
}

/// `POST /api/connections/wait`
///
/// Polls until the connection settles or the timeout passes, in which case
/// the status is `timed_out`. The wait ends early when the client goes away
/// or the server shuts down.
pub async fn wait_for_connection_handler(
    State(state): State<AppState>,
    Json(body): Json<WaitForConnectionRequest>,
) -> AppResult<Json<ConnectionStatusResponse>> {
    let connection_id = required(body.connection_id, "Missing required fields")?;
    let key = credential(body.platform_api_key.as_deref(), None, "Missing required fields")?;

    let timeout = body
        .timeout_ms
        .map(Duration::from_millis)
        .map_or(state.config.connection_timeout, |t| {
            t.min(state.config.connection_timeout)
        });
    let options = WaitOptions::new(timeout, state.config.connection_poll_interval);
    debug!(connection_id = %connection_id, ?options, "waiting for connection");

    let cancel = state.shutdown.child_token();
    let status =
        wait_for_connection(&*state.platform, &key, &connection_id, options, &cancel).await?;
    Ok(Json(ConnectionStatusResponse {
        terminal: status.is_terminal(),
        connection_id,
        status,
    }))
}

/// Describe one tool from its toolkit's lookup result.
fn describe_tool(
    tool: String,
    lookups: &HashMap<String, Result<Toolkit, ToolkitError>>,
) -> RequiredApp {
    let toolkit_slug = extract_toolkit_slug(&tool);
    match lookups.get(&toolkit_slug) {
        Some(Ok(toolkit)) => RequiredApp {
            auth_mode: toolkit.primary_auth_mode().map(str::to_string),
            platform_managed: !toolkit.managed_auth_schemes.is_empty(),
            name: Some(toolkit.name.clone()),
            tool,
            toolkit_slug,
            error: None,
        },
        Some(Err(e)) => RequiredApp {
            tool,
            toolkit_slug,
            name: None,
            auth_mode: None,
            platform_managed: false,
            error: Some(e.to_string()),
        },
        None => RequiredApp {
            error: Some(format!("Toolkit not looked up: {toolkit_slug}")),
            tool,
            toolkit_slug,
            name: None,
            auth_mode: None,
            platform_managed: false,
        },
    }
}

/// `POST /api/connect-apps`
///
/// Lists what each of an agent's tools needs connected. Each distinct toolkit
/// is looked up once, concurrently. Lookup failures stay per tool, except a
/// rejected platform key, which fails the request.
pub async fn connect_apps_handler(
    State(state): State<AppState>,
    Json(body): Json<ConnectAppsRequest>,
) -> AppResult<Json<ConnectAppsResponse>> {
    let key = credential(
        body.platform_api_key.as_deref(),
        None,
        "Platform API key is required",
    )?;
    let tools = body
        .required_apps
        .ok_or_else(|| AppError::Validation("Required apps list is needed".into()))?;

    let slugs = distinct_toolkit_slugs(&tools);
    let results = join_all(
        slugs
            .iter()
            .map(|slug| fetch_toolkit(&*state.platform, &key, slug)),
    )
    .await;

    let mut lookups = HashMap::with_capacity(slugs.len());
    for (slug, result) in slugs.into_iter().zip(results) {
        if let Err(ToolkitError::Unauthorized(reason)) = result {
            return Err(ToolkitError::Unauthorized(reason).into());
        }
        lookups.insert(slug, result);
    }

    let apps: Vec<RequiredApp> = tools
        .into_iter()
        .map(|tool| describe_tool(tool, &lookups))
        .collect();

    info!(apps = apps.len(), "required apps described");
    Ok(Json(ConnectAppsResponse {
        total_apps: apps.len(),
        apps,
    }))
}
