//! Shared fixtures: in-memory platform and LLM doubles plus request helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use agentsmith_api::config::ApiConfig;
use agentsmith_api::{AppState, router};
use agentsmith_core::ApiCredential;
use agentsmith_core::agent::llm::{ChatModel, ChatRequest, ChatTurn, LlmError, ToolCall};
use agentsmith_core::toolkit::ToolkitError;
use agentsmith_core::toolkit::models::{
    AuthConfig, AuthSchemeDetail, ConnectionInitiation, ConnectionStatus, InitiatedConnection,
    NewAuthConfig, ToolExecution, ToolQuery, ToolSchema, Toolkit,
};
use agentsmith_core::toolkit::platform::ToolkitPlatform;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const VALID_KEY: &str = "ck_test";

#[derive(Default)]
pub struct StubPlatform {
    toolkits: HashMap<String, Toolkit>,
    configs: std::sync::Mutex<Vec<AuthConfig>>,
    tool_results: HashMap<String, ToolExecution>,
    status: Option<ConnectionStatus>,
    direct_status: Option<ConnectionStatus>,
    pub toolkit_fetches: AtomicU32,
    pub initiations: AtomicU32,
    pub status_polls: AtomicU32,
}

impl StubPlatform {
    pub fn with_toolkit(mut self, slug: &str, name: &str, managed: &[&str], modes: &[&str]) -> Self {
        self.toolkits.insert(
            slug.to_string(),
            Toolkit {
                slug: slug.to_string(),
                name: name.to_string(),
                managed_auth_schemes: managed.iter().map(|s| s.to_string()).collect(),
                auth_scheme_details: modes
                    .iter()
                    .map(|m| AuthSchemeDetail { mode: m.to_string() })
                    .collect(),
            },
        );
        self
    }

    pub fn with_tool(mut self, slug: &str, result: ToolExecution) -> Self {
        self.tool_results.insert(slug.to_string(), result);
        self
    }

    pub fn with_status(mut self, status: ConnectionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_direct_status(mut self, status: ConnectionStatus) -> Self {
        self.direct_status = Some(status);
        self
    }

    fn check(&self, credential: &ApiCredential) -> Result<(), ToolkitError> {
        if credential.expose() == VALID_KEY {
            Ok(())
        } else {
            Err(ToolkitError::Unauthorized("invalid API key".into()))
        }
    }
}

#[async_trait]
impl ToolkitPlatform for StubPlatform {
    async fn fetch_toolkit(
        &self,
        credential: &ApiCredential,
        slug: &str,
    ) -> Result<Toolkit, ToolkitError> {
        self.check(credential)?;
        self.toolkit_fetches.fetch_add(1, Ordering::SeqCst);
        self.toolkits
            .get(slug)
            .cloned()
            .ok_or_else(|| ToolkitError::NotFound(slug.to_string()))
    }

    async fn list_auth_configs(
        &self,
        credential: &ApiCredential,
        toolkit_slug: &str,
    ) -> Result<Vec<AuthConfig>, ToolkitError> {
        self.check(credential)?;
        Ok(self
            .configs
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.toolkit_slug == toolkit_slug)
            .cloned()
            .collect())
    }

    async fn create_auth_config(
        &self,
        credential: &ApiCredential,
        toolkit_slug: &str,
        config: &NewAuthConfig,
    ) -> Result<AuthConfig, ToolkitError> {
        self.check(credential)?;
        let mut configs = self.configs.lock().unwrap();
        let created = AuthConfig {
            id: format!("ac_{}", configs.len() + 1),
            toolkit_slug: toolkit_slug.to_string(),
            kind: config.kind,
            auth_scheme: config.auth_scheme.map(str::to_string),
        };
        configs.push(created.clone());
        Ok(created)
    }

    async fn initiate_connection(
        &self,
        credential: &ApiCredential,
        initiation: &ConnectionInitiation,
    ) -> Result<InitiatedConnection, ToolkitError> {
        self.check(credential)?;
        let n = self.initiations.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("ca_{n}");
        Ok(if initiation.data.is_some() {
            InitiatedConnection {
                id,
                status: self.direct_status.unwrap_or(ConnectionStatus::Active),
                redirect_url: None,
            }
        } else {
            InitiatedConnection {
                redirect_url: Some(format!("https://auth.example/{id}")),
                id,
                status: ConnectionStatus::PendingRedirect,
            }
        })
    }

    async fn connection_status(
        &self,
        credential: &ApiCredential,
        _connection_id: &str,
    ) -> Result<ConnectionStatus, ToolkitError> {
        self.check(credential)?;
        self.status_polls.fetch_add(1, Ordering::SeqCst);
        Ok(self.status.unwrap_or(ConnectionStatus::Connecting))
    }

    async fn list_tools(
        &self,
        credential: &ApiCredential,
        query: &ToolQuery,
    ) -> Result<Vec<ToolSchema>, ToolkitError> {
        self.check(credential)?;
        let schema = |slug: &String| ToolSchema {
            slug: slug.clone(),
            name: slug.clone(),
            description: String::new(),
            input_parameters: serde_json::json!({ "type": "object", "properties": {} }),
        };
        Ok(match query {
            ToolQuery::Slugs(slugs) => slugs
                .iter()
                .filter(|s| self.tool_results.contains_key(*s))
                .map(schema)
                .collect(),
            ToolQuery::Search { limit, .. } => {
                let mut slugs: Vec<&String> = self.tool_results.keys().collect();
                slugs.sort();
                slugs.into_iter().take(*limit).map(schema).collect()
            }
        })
    }

    async fn execute_tool(
        &self,
        credential: &ApiCredential,
        tool_slug: &str,
        _user_id: &str,
        _arguments: &Value,
    ) -> Result<ToolExecution, ToolkitError> {
        self.check(credential)?;
        self.tool_results
            .get(tool_slug)
            .cloned()
            .ok_or_else(|| ToolkitError::NotFound(tool_slug.to_string()))
    }

    fn dashboard_url(&self, toolkit_slug: &str) -> String {
        format!("https://app.composio.dev/apps/{toolkit_slug}")
    }
}

/// Calls every tool it is offered once, then answers with fixed text.
pub struct StubChat {
    pub answer: String,
}

#[async_trait]
impl ChatModel for StubChat {
    async fn complete(
        &self,
        _credential: &ApiCredential,
        request: &ChatRequest,
    ) -> Result<ChatTurn, LlmError> {
        let answered = request
            .messages
            .iter()
            .any(|m| matches!(m, agentsmith_core::agent::llm::ChatMessage::Tool { .. }));
        if answered || request.tools.is_empty() {
            return Ok(ChatTurn {
                text: Some(self.answer.clone()),
                tool_calls: Vec::new(),
            });
        }
        Ok(ChatTurn {
            text: None,
            tool_calls: request
                .tools
                .iter()
                .enumerate()
                .map(|(i, t)| ToolCall {
                    id: format!("call_{i}"),
                    name: t.slug.clone(),
                    arguments: serde_json::json!({}),
                })
                .collect(),
        })
    }
}

pub fn app(platform: StubPlatform) -> Router {
    app_with_shared(Arc::new(platform))
}

pub fn app_with_shared(platform: Arc<StubPlatform>) -> Router {
    router(AppState {
        config: ApiConfig::default(),
        platform,
        llm: Arc::new(StubChat {
            answer: "done".into(),
        }),
        shutdown: CancellationToken::new(),
    })
}

pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.expect("request");
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, req).await
}
