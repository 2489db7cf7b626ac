//! # agentsmith_api
//!
//! HTTP API library for Agentsmith.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;

use std::sync::Arc;

use agentsmith_core::agent::llm::ChatModel;
use agentsmith_core::toolkit::platform::ToolkitPlatform;
use axum::Router;
use axum::routing::{get, post};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{agents, callback, connections, health, toolkits};

/// Route paths.
pub mod routes {
    pub const GET_API_HEALTH: &str = "/api/health";
    pub const POST_API_GENERATE_AGENT: &str = "/api/generate-agent";
    pub const POST_API_EXECUTE_GENERATED_AGENT: &str = "/api/execute-generated-agent";
    pub const POST_API_CREATE_CONNECTION: &str = "/api/create-connection";
    pub const GET_API_CONNECTION_STATUS: &str = "/api/connection-status";
    pub const POST_API_CONNECTIONS_WAIT: &str = "/api/connections/wait";
    pub const GET_API_CONNECTIONS_CALLBACK: &str = "/api/connections/callback";
    pub const GET_API_TOOLKIT_INFO: &str = "/api/toolkit-info";
    pub const POST_API_CONNECT_APPS: &str = "/api/connect-apps";
}

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Integration platform client.
    pub platform: Arc<dyn ToolkitPlatform>,
    /// LLM client.
    pub llm: Arc<dyn ChatModel>,
    /// Cancelled on server shutdown; ends in-flight connection waits.
    pub shutdown: CancellationToken,
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(routes::GET_API_HEALTH, get(health::health))
        .route(
            routes::POST_API_GENERATE_AGENT,
            post(agents::generate_agent_handler),
        )
        .route(
            routes::POST_API_EXECUTE_GENERATED_AGENT,
            post(agents::execute_agent_handler),
        )
        .route(
            routes::POST_API_CREATE_CONNECTION,
            post(connections::create_connection_handler),
        )
        .route(
            routes::GET_API_CONNECTION_STATUS,
            get(connections::connection_status_handler),
        )
        .route(
            routes::POST_API_CONNECTIONS_WAIT,
            post(connections::wait_for_connection_handler),
        )
        .route(
            routes::GET_API_CONNECTIONS_CALLBACK,
            get(callback::oauth_callback),
        )
        .route(routes::GET_API_TOOLKIT_INFO, get(toolkits::toolkit_info))
        .route(
            routes::POST_API_CONNECT_APPS,
            post(connections::connect_apps_handler),
        )
        .layer(cors)
        .with_state(state)
}
