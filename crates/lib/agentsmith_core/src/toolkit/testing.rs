//! In-memory platform double for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::ToolkitError;
use super::models::{
    AuthConfig, AuthConfigKind, AuthSchemeDetail, ConnectionInitiation, ConnectionStatus,
    InitiatedConnection, NewAuthConfig, ToolExecution, ToolQuery, ToolSchema, Toolkit,
};
use super::platform::ToolkitPlatform;
use crate::credential::ApiCredential;

/// Per-operation call counters.
#[derive(Default)]
pub struct CallCounts {
    pub fetch_toolkit: AtomicU32,
    pub list_auth_configs: AtomicU32,
    pub create_auth_config: AtomicU32,
    pub initiate_connection: AtomicU32,
    pub connection_status: AtomicU32,
    pub list_tools: AtomicU32,
    pub execute_tool: AtomicU32,
}

impl CallCounts {
    pub fn get(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> u32 {
        [
            &self.fetch_toolkit,
            &self.list_auth_configs,
            &self.create_auth_config,
            &self.initiate_connection,
            &self.connection_status,
            &self.list_tools,
            &self.execute_tool,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

fn bump(counter: &AtomicU32) {
    counter.fetch_add(1, Ordering::SeqCst);
}

/// Scriptable stand-in for the integration platform.
#[derive(Default)]
pub struct FakePlatform {
    toolkits: HashMap<String, Toolkit>,
    configs: Mutex<Vec<AuthConfig>>,
    pub created: Mutex<Vec<NewAuthConfig>>,
    pub initiations: Mutex<Vec<ConnectionInitiation>>,
    /// Statuses returned by successive polls; the last one repeats.
    statuses: Mutex<VecDeque<ConnectionStatus>>,
    /// Reply status for direct-credential initiations; `Active` when unset.
    direct_status: Option<ConnectionStatus>,
    /// Added to every status poll.
    status_delay: Option<Duration>,
    tools: Vec<ToolSchema>,
    tool_results: HashMap<String, ToolExecution>,
    list_tools_error: Option<String>,
    calls: CallCounts,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_toolkit(mut self, slug: &str, name: &str, managed: &[&str], modes: &[&str]) -> Self {
        self.toolkits.insert(
            slug.to_string(),
            Toolkit {
                slug: slug.to_string(),
                name: name.to_string(),
                managed_auth_schemes: managed.iter().map(|s| s.to_string()).collect(),
                auth_scheme_details: modes
                    .iter()
                    .map(|m| AuthSchemeDetail {
                        mode: m.to_string(),
                    })
                    .collect(),
            },
        );
        self
    }

    pub fn with_config(self, id: &str, toolkit_slug: &str, kind: AuthConfigKind) -> Self {
        self.configs.lock().unwrap().push(AuthConfig {
            id: id.to_string(),
            toolkit_slug: toolkit_slug.to_string(),
            kind,
            auth_scheme: None,
        });
        self
    }

    pub fn with_statuses(self, statuses: &[ConnectionStatus]) -> Self {
        self.statuses.lock().unwrap().extend(statuses.iter().copied());
        self
    }

    pub fn with_direct_status(mut self, status: ConnectionStatus) -> Self {
        self.direct_status = Some(status);
        self
    }

    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = Some(delay);
        self
    }

    pub fn with_tool(mut self, slug: &str, result: ToolExecution) -> Self {
        self.tools.push(ToolSchema {
            slug: slug.to_string(),
            name: slug.to_string(),
            description: format!("{slug} tool"),
            input_parameters: serde_json::json!({ "type": "object", "properties": {} }),
        });
        self.tool_results.insert(slug.to_string(), result);
        self
    }

    pub fn with_list_tools_error(mut self, message: &str) -> Self {
        self.list_tools_error = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> &CallCounts {
        &self.calls
    }

    pub fn config_count(&self) -> usize {
        self.configs.lock().unwrap().len()
    }
}

#[async_trait]
impl ToolkitPlatform for FakePlatform {
    async fn fetch_toolkit(
        &self,
        _credential: &ApiCredential,
        slug: &str,
    ) -> Result<Toolkit, ToolkitError> {
        bump(&self.calls.fetch_toolkit);
        self.toolkits
            .get(slug)
            .cloned()
            .ok_or_else(|| ToolkitError::NotFound(slug.to_string()))
    }

    async fn list_auth_configs(
        &self,
        _credential: &ApiCredential,
        toolkit_slug: &str,
    ) -> Result<Vec<AuthConfig>, ToolkitError> {
        bump(&self.calls.list_auth_configs);
        Ok(self
            .configs
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.toolkit_slug.eq_ignore_ascii_case(toolkit_slug))
            .cloned()
            .collect())
    }

    async fn create_auth_config(
        &self,
        _credential: &ApiCredential,
        toolkit_slug: &str,
        config: &NewAuthConfig,
    ) -> Result<AuthConfig, ToolkitError> {
        bump(&self.calls.create_auth_config);
        let mut configs = self.configs.lock().unwrap();
        let created = AuthConfig {
            id: format!("ac_{}", configs.len() + 1),
            toolkit_slug: toolkit_slug.to_string(),
            kind: config.kind,
            auth_scheme: config.auth_scheme.map(str::to_string),
        };
        configs.push(created.clone());
        self.created.lock().unwrap().push(config.clone());
        Ok(created)
    }

    async fn initiate_connection(
        &self,
        _credential: &ApiCredential,
        initiation: &ConnectionInitiation,
    ) -> Result<InitiatedConnection, ToolkitError> {
        bump(&self.calls.initiate_connection);
        let mut initiations = self.initiations.lock().unwrap();
        initiations.push(initiation.clone());
        let id = format!("ca_{}", initiations.len());
        Ok(match initiation.data {
            Some(_) => InitiatedConnection {
                id,
                status: self.direct_status.unwrap_or(ConnectionStatus::Active),
                redirect_url: None,
            },
            None => InitiatedConnection {
                redirect_url: Some(format!("https://auth.example/{id}")),
                id,
                status: ConnectionStatus::PendingRedirect,
            },
        })
    }

    async fn connection_status(
        &self,
        _credential: &ApiCredential,
        _connection_id: &str,
    ) -> Result<ConnectionStatus, ToolkitError> {
        bump(&self.calls.connection_status);
        if let Some(delay) = self.status_delay {
            tokio::time::sleep(delay).await;
        }
        let mut statuses = self.statuses.lock().unwrap();
        Ok(if statuses.len() > 1 {
            statuses.pop_front().unwrap_or(ConnectionStatus::Connecting)
        } else {
            statuses.front().copied().unwrap_or(ConnectionStatus::Connecting)
        })
    }

    async fn list_tools(
        &self,
        _credential: &ApiCredential,
        query: &ToolQuery,
    ) -> Result<Vec<ToolSchema>, ToolkitError> {
        bump(&self.calls.list_tools);
        if let Some(message) = &self.list_tools_error {
            return Err(ToolkitError::Upstream {
                status: 400,
                body: message.clone(),
            });
        }
        Ok(match query {
            ToolQuery::Slugs(slugs) => self
                .tools
                .iter()
                .filter(|t| slugs.iter().any(|s| s.eq_ignore_ascii_case(&t.slug)))
                .cloned()
                .collect(),
            ToolQuery::Search { limit, .. } => self.tools.iter().take(*limit).cloned().collect(),
        })
    }

    async fn execute_tool(
        &self,
        _credential: &ApiCredential,
        tool_slug: &str,
        _user_id: &str,
        _arguments: &Value,
    ) -> Result<ToolExecution, ToolkitError> {
        bump(&self.calls.execute_tool);
        self.tool_results
            .get(tool_slug)
            .cloned()
            .ok_or_else(|| ToolkitError::NotFound(tool_slug.to_string()))
    }

    fn dashboard_url(&self, toolkit_slug: &str) -> String {
        format!("https://dashboard.example/apps/{toolkit_slug}")
    }
}
