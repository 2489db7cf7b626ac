use clap::{Args, Parser, Subcommand};

pub const DEFAULT_PLATFORM_URL: &str = "https://backend.composio.dev/api/v3";
pub const DEFAULT_DASHBOARD_URL: &str = "https://app.composio.dev";

#[derive(Parser, Debug)]
#[command(
    name = "agentsmith",
    version,
    about = "Connect integration toolkits for generated agents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the version and exit.
    Version,

    /// Print the distinct toolkits behind a list of tool identifiers.
    Toolkits {
        /// Tool identifiers such as GMAIL_FETCH_EMAIL.
        #[arg(required = true)]
        tools: Vec<String>,
    },

    /// Print a toolkit's metadata as JSON.
    Toolkit {
        slug: String,

        #[command(flatten)]
        platform: PlatformArgs,
    },

    /// Connect a toolkit for a user.
    Connect(ConnectArgs),
}

#[derive(Args, Debug)]
pub struct PlatformArgs {
    /// Integration platform API key.
    #[arg(long, env = "COMPOSIO_API_KEY", hide_env_values = true)]
    pub platform_key: Option<String>,

    /// Integration platform API root.
    #[arg(long, env = "PLATFORM_BASE_URL", default_value = DEFAULT_PLATFORM_URL)]
    pub platform_url: String,

    /// Platform dashboard origin, for manual setup links.
    #[arg(long, env = "PLATFORM_DASHBOARD_URL", default_value = DEFAULT_DASHBOARD_URL)]
    pub dashboard_url: String,
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Toolkit slug, e.g. gmail.
    pub slug: String,

    /// oauth2, api_key or bearer_token (aliases like "oauth" are accepted).
    #[arg(long, default_value = "oauth2")]
    pub auth_type: String,

    #[arg(long, default_value = "default")]
    pub user_id: String,

    /// Use your own app credentials instead of platform-managed auth.
    #[arg(long)]
    pub custom: bool,

    #[arg(long)]
    pub client_id: Option<String>,

    #[arg(long, env = "TOOLKIT_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Toolkit API key (api_key and bearer_token auth).
    #[arg(long, env = "TOOLKIT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "TOOLKIT_BEARER_TOKEN", hide_env_values = true)]
    pub bearer_token: Option<String>,

    /// Wait for the connection to finish after printing the redirect URL.
    #[arg(long)]
    pub wait: bool,

    #[arg(long, default_value_t = 300)]
    pub timeout_secs: u64,

    #[command(flatten)]
    pub platform: PlatformArgs,
}
