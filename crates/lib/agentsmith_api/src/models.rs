//! Request and response bodies.
//!
//! Field names are camelCase on the wire. Every platform key field also
//! accepts the older `composioApiKey` name.

use agentsmith_core::toolkit::models::{ConnectionStatus, Credentials, Toolkit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error body returned by every failing route.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind (`not_found`, `missing_credentials`, ...).
    pub error: String,
    pub message: String,
    /// Identifiers the client needs to act on the error.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
}

// =============================================================================
// Agents
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAgentRequest {
    pub agent_idea: Option<String>,
    /// Falls back to the server's `OPENAI_API_KEY`.
    pub llm_api_key: Option<String>,
    /// Falls back to the server's `COMPOSIO_API_KEY`.
    #[serde(alias = "composioApiKey")]
    pub platform_api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteAgentRequest {
    pub llm_api_key: Option<String>,
    #[serde(alias = "composioApiKey")]
    pub platform_api_key: Option<String>,
    pub prompt: Option<String>,
    #[serde(default)]
    pub discovered_tools: Vec<String>,
    pub system_prompt: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteAgentResponse {
    pub response: String,
    pub success: bool,
    pub metadata: ExecuteAgentMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteAgentMetadata {
    pub tools_used: Vec<String>,
    pub system_prompt: String,
    pub steps: u32,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Connections
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConnectionRequest {
    #[serde(alias = "composioApiKey")]
    pub platform_api_key: Option<String>,
    pub toolkit_slug: Option<String>,
    pub auth_type: Option<String>,
    #[serde(default)]
    pub credentials: Credentials,
    pub user_id: Option<String>,
    #[serde(default)]
    pub custom_auth: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConnectionResponse {
    pub success: bool,
    pub auth_type: String,
    pub toolkit_slug: String,
    pub toolkit_name: String,
    pub auth_config_id: String,
    pub connection_id: String,
    pub status: ConnectionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusQuery {
    pub connection_id: Option<String>,
    #[serde(alias = "composioApiKey")]
    pub platform_api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitForConnectionRequest {
    pub connection_id: Option<String>,
    #[serde(alias = "composioApiKey")]
    pub platform_api_key: Option<String>,
    /// Capped at the server's connection timeout.
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusResponse {
    pub connection_id: String,
    pub status: ConnectionStatus,
    pub terminal: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectAppsRequest {
    #[serde(alias = "composioApiKey")]
    pub platform_api_key: Option<String>,
    pub required_apps: Option<Vec<String>>,
}

/// What a tool needs connected before an agent can call it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredApp {
    pub tool: String,
    pub toolkit_slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_mode: Option<String>,
    pub platform_managed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectAppsResponse {
    pub apps: Vec<RequiredApp>,
    pub total_apps: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackQuery {
    pub status: Option<String>,
    pub connected_account_id: Option<String>,
    pub app_name: Option<String>,
}

// =============================================================================
// Toolkits
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolkitInfoQuery {
    pub slug: Option<String>,
    #[serde(alias = "composioApiKey")]
    pub platform_api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ToolkitInfoResponse {
    pub success: bool,
    pub toolkit: Toolkit,
}
