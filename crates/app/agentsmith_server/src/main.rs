//! Agentsmith HTTP server binary.
//!
//! Serves the agent generation and toolkit connection API. Configuration
//! comes from flags, the environment and an optional `.env` file.

use std::sync::Arc;
use std::time::Duration;

use agentsmith_api::config::ApiConfig;
use agentsmith_core::agent::llm::OpenAiChat;
use agentsmith_core::toolkit::platform::PlatformClient;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// CLI arguments for the server. Anything not given here is read by
/// [`ApiConfig::from_env`].
#[derive(Parser, Debug)]
#[command(name = "agentsmith_server", about = "Agentsmith API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3100")]
    bind: String,

    /// Integration platform API root.
    #[arg(long, env = "PLATFORM_BASE_URL")]
    platform_url: Option<String>,

    /// OpenAI-compatible API root.
    #[arg(long, env = "LLM_BASE_URL")]
    llm_url: Option<String>,

    /// Outbound HTTP request timeout in seconds.
    #[arg(long, default_value_t = 60)]
    http_timeout_secs: u64,
}

/// Resolves on ctrl-c, cancelling in-flight connection waits first.
async fn shutdown_signal(token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
    token.cancel();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,agentsmith_api=debug,agentsmith_core=debug")
            }),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    config.bind_addr = args.bind;
    if let Some(url) = args.platform_url {
        config.platform_base_url = url;
    }
    if let Some(url) = args.llm_url {
        config.llm_base_url = url;
    }

    info!(
        bind = %config.bind_addr,
        platform = %config.platform_base_url,
        llm = %config.llm_base_url,
        agent_model = %config.agent_model,
        "starting agentsmith_server"
    );

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.http_timeout_secs))
        .build()?;
    let platform = PlatformClient::new(
        http.clone(),
        &config.platform_base_url,
        &config.platform_dashboard_url,
    )?
    .with_callback_url(config.callback_url());
    let llm = OpenAiChat::new(http, &config.llm_base_url);

    let shutdown = CancellationToken::new();
    let state = agentsmith_api::AppState {
        config: config.clone(),
        platform: Arc::new(platform),
        llm: Arc::new(llm),
        shutdown: shutdown.clone(),
    };
    let app = agentsmith_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("server stopped");
    Ok(())
}
