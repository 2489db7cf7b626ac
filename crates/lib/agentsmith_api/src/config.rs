//! API server configuration.

use std::time::Duration;

use agentsmith_core::ApiCredential;
use agentsmith_core::toolkit::waiter::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};
use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3100";
pub const DEFAULT_PLATFORM_BASE_URL: &str = "https://backend.composio.dev/api/v3";
pub const DEFAULT_PLATFORM_DASHBOARD_URL: &str = "https://app.composio.dev";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_AGENT_MODEL: &str = "gpt-4.1";
pub const DEFAULT_UTILITY_MODEL: &str = "gpt-4o-mini";

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// Integration platform API root.
    pub platform_base_url: String,
    /// Platform dashboard root, used for manual setup links.
    pub platform_dashboard_url: String,
    /// OpenAI-compatible API root.
    pub llm_base_url: String,
    /// Server-side platform key for agent generation when the request has none.
    pub platform_api_key: Option<ApiCredential>,
    /// Server-side LLM key for agent generation when the request has none.
    pub llm_api_key: Option<ApiCredential>,
    pub agent_model: String,
    pub utility_model: String,
    /// Upper bound for `POST /api/connections/wait`.
    pub connection_timeout: Duration,
    pub connection_poll_interval: Duration,
    /// Public origin of this server, used to build the OAuth callback URL.
    pub public_base_url: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.into(),
            platform_base_url: DEFAULT_PLATFORM_BASE_URL.into(),
            platform_dashboard_url: DEFAULT_PLATFORM_DASHBOARD_URL.into(),
            llm_base_url: DEFAULT_LLM_BASE_URL.into(),
            platform_api_key: None,
            llm_api_key: None,
            agent_model: DEFAULT_AGENT_MODEL.into(),
            utility_model: DEFAULT_UTILITY_MODEL.into(),
            connection_timeout: DEFAULT_TIMEOUT,
            connection_poll_interval: DEFAULT_POLL_INTERVAL,
            public_base_url: None,
        }
    }
}

fn env_secs(name: &str, default: Duration) -> Duration {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(variable = name, value = %raw, "not a number of seconds, using default");
                default
            }
        },
        Err(_) => default,
    }
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                  | Default                               |
    /// |---------------------------|---------------------------------------|
    /// | `BIND_ADDR`               | `127.0.0.1:3100`                      |
    /// | `PLATFORM_BASE_URL`       | `https://backend.composio.dev/api/v3` |
    /// | `PLATFORM_DASHBOARD_URL`  | `https://app.composio.dev`            |
    /// | `LLM_BASE_URL`            | `https://api.openai.com/v1`           |
    /// | `COMPOSIO_API_KEY`        | unset                                 |
    /// | `OPENAI_API_KEY`          | unset                                 |
    /// | `AGENT_MODEL`             | `gpt-4.1`                             |
    /// | `UTILITY_MODEL`           | `gpt-4o-mini`                         |
    /// | `CONNECTION_TIMEOUT_SECS` | `300`                                 |
    /// | `CONNECTION_POLL_SECS`    | `3`                                   |
    /// | `PUBLIC_BASE_URL`         | unset                                 |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str, default: String| std::env::var(name).unwrap_or(default);
        Self {
            bind_addr: var("BIND_ADDR", defaults.bind_addr),
            platform_base_url: var("PLATFORM_BASE_URL", defaults.platform_base_url),
            platform_dashboard_url: var("PLATFORM_DASHBOARD_URL", defaults.platform_dashboard_url),
            llm_base_url: var("LLM_BASE_URL", defaults.llm_base_url),
            platform_api_key: ApiCredential::from_optional(
                std::env::var("COMPOSIO_API_KEY").ok().as_deref(),
            ),
            llm_api_key: ApiCredential::from_optional(std::env::var("OPENAI_API_KEY").ok().as_deref()),
            agent_model: var("AGENT_MODEL", defaults.agent_model),
            utility_model: var("UTILITY_MODEL", defaults.utility_model),
            connection_timeout: env_secs("CONNECTION_TIMEOUT_SECS", defaults.connection_timeout),
            connection_poll_interval: env_secs("CONNECTION_POLL_SECS", defaults.connection_poll_interval),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }

    /// Where the platform should send users after an OAuth consent screen.
    pub fn callback_url(&self) -> Option<String> {
        self.public_base_url
            .as_deref()
            .map(|base| format!("{}/api/connections/callback", base.trim_end_matches('/')))
    }
}
