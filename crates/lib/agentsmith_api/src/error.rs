//! Application error types.

use agentsmith_core::agent::AgentError;
use agentsmith_core::agent::llm::LlmError;
use agentsmith_core::toolkit::ToolkitError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::warn;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Toolkit(#[from] ToolkitError),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

type Parts = (StatusCode, &'static str, String, Map<String, Value>);

fn details(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn toolkit_parts(e: &ToolkitError) -> Parts {
    let message = e.to_string();
    match e {
        ToolkitError::NotFound(_) | ToolkitError::ConnectionNotFound(_) => {
            (StatusCode::NOT_FOUND, "not_found", message, Map::new())
        }
        ToolkitError::Unauthorized(_) => {
            (StatusCode::UNAUTHORIZED, "unauthorized", message, Map::new())
        }
        ToolkitError::MissingCredentials { fields } => (
            StatusCode::BAD_REQUEST,
            "missing_credentials",
            message,
            details(json!({ "fields": fields })),
        ),
        ToolkitError::UnsupportedAuthType {
            toolkit_name,
            auth_type,
            dashboard_url,
        } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "unsupported_auth_type",
            message,
            details(json!({
                "needsCustomSetup": true,
                "toolkitName": toolkit_name,
                "authType": auth_type,
                "dashboardUrl": dashboard_url,
            })),
        ),
        ToolkitError::Upstream { status, .. } => (
            StatusCode::BAD_GATEWAY,
            "upstream_error",
            message,
            details(json!({ "upstreamStatus": status })),
        ),
        ToolkitError::Timeout {
            connection_id,
            waited,
        } => (
            StatusCode::GATEWAY_TIMEOUT,
            "timeout",
            message,
            details(json!({ "connectionId": connection_id, "waitedSecs": waited.as_secs() })),
        ),
        ToolkitError::Cancelled => (
            StatusCode::SERVICE_UNAVAILABLE,
            "cancelled",
            message,
            Map::new(),
        ),
        ToolkitError::Transport(_) | ToolkitError::InvalidResponse(_) => {
            (StatusCode::BAD_GATEWAY, "platform_unavailable", message, Map::new())
        }
    }
}

fn agent_parts(e: &AgentError) -> Parts {
    let message = e.to_string();
    match e {
        AgentError::Validation(m) => (
            StatusCode::BAD_REQUEST,
            "validation_error",
            m.clone(),
            Map::new(),
        ),
        AgentError::ConnectionRequired { tools } => (
            StatusCode::BAD_REQUEST,
            "connection_required",
            message,
            details(json!({ "requiresConnection": true, "tools": tools })),
        ),
        AgentError::NoConnectedAccount { tool, toolkit } => (
            StatusCode::BAD_REQUEST,
            "account_connection_required",
            message,
            details(json!({
                "requiresConnection": true,
                "toolName": tool,
                "appName": toolkit,
                "suggestion": format!("Connect your {toolkit} account using the Connect Apps feature."),
            })),
        ),
        AgentError::ToolExecution { tool, .. } => (
            StatusCode::BAD_REQUEST,
            "tool_execution_failed",
            message,
            details(json!({ "toolError": true, "toolName": tool })),
        ),
        AgentError::Llm(LlmError::Provider { status, .. }) => (
            StatusCode::BAD_GATEWAY,
            "llm_error",
            message,
            details(json!({ "upstreamStatus": status })),
        ),
        AgentError::Llm(_) => (StatusCode::BAD_GATEWAY, "llm_error", message, Map::new()),
        AgentError::Platform(inner) => toolkit_parts(inner),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message, details) = match &self {
            AppError::Validation(m) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                m.clone(),
                Map::new(),
            ),
            AppError::Toolkit(e) => toolkit_parts(e),
            AppError::Agent(e) => agent_parts(e),
        };
        if status.is_server_error() {
            warn!(%status, error, "{message}");
        }
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
            details,
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn status_of(e: AppError) -> StatusCode {
        e.into_response().status()
    }

    #[test]
    fn toolkit_errors_map_to_distinct_statuses() {
        assert_eq!(
            status_of(ToolkitError::NotFound("x".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ToolkitError::ConnectionNotFound("ca_1".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ToolkitError::Unauthorized("x".into()).into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(ToolkitError::MissingCredentials { fields: vec!["apiKey"] }.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                ToolkitError::Upstream {
                    status: 500,
                    body: "boom".into()
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(
                ToolkitError::Timeout {
                    connection_id: "ca_1".into(),
                    waited: Duration::from_secs(300)
                }
                .into()
            ),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn platform_errors_inside_agent_errors_keep_their_status() {
        let e: AppError = AgentError::Platform(ToolkitError::Unauthorized("bad key".into())).into();
        assert_eq!(status_of(e), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn unsupported_auth_type_body_carries_dashboard_link() {
        let e = ToolkitError::UnsupportedAuthType {
            toolkit_name: "Jira".into(),
            auth_type: "oauth2".into(),
            dashboard_url: "https://app.composio.dev/apps/jira".into(),
        };
        let (status, error, _, details) = toolkit_parts(&e);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error, "unsupported_auth_type");
        assert_eq!(details["dashboardUrl"], "https://app.composio.dev/apps/jira");
    }
}
