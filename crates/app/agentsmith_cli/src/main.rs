// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use std::time::Duration;

use agentsmith_core::ApiCredential;
use agentsmith_core::toolkit::flow::{ConnectRequest, connect_toolkit};
use agentsmith_core::toolkit::models::{ConnectionStatus, Credentials};
use agentsmith_core::toolkit::naming::distinct_toolkit_slugs;
use agentsmith_core::toolkit::platform::PlatformClient;
use agentsmith_core::toolkit::waiter::{DEFAULT_POLL_INTERVAL, WaitOptions, wait_for_connection};
use agentsmith_core::toolkit::{ToolkitError, fetch_toolkit};
use clap::Parser;
use cli::{Cli, Commands, ConnectArgs, PlatformArgs};
use tokio_util::sync::CancellationToken;

mod cli;
mod logging;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = run().await {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    logging::init()?;

    let args = Cli::parse();

    match args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        Commands::Toolkits { tools } => {
            for slug in distinct_toolkit_slugs(&tools) {
                println!("{slug}");
            }
        }
        Commands::Toolkit { slug, platform } => {
            let (client, key) = platform_client(&platform)?;
            let toolkit = fetch_toolkit(&client, &key, &slug).await?;
            println!("{}", serde_json::to_string_pretty(&toolkit)?);
        }
        Commands::Connect(args) => connect(args).await?,
    }

    Ok(())
}

fn platform_client(args: &PlatformArgs) -> Result<(PlatformClient, ApiCredential)> {
    let key = ApiCredential::from_optional(args.platform_key.as_deref()).ok_or_else(|| {
        Error::Custom("A platform API key is required (--platform-key or COMPOSIO_API_KEY)".into())
    })?;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;
    let client = PlatformClient::new(http, &args.platform_url, &args.dashboard_url)?;
    Ok((client, key))
}

async fn connect(args: ConnectArgs) -> Result<()> {
    let (client, key) = platform_client(&args.platform)?;
    let request = ConnectRequest {
        toolkit_slug: args.slug,
        auth_type: args.auth_type,
        user_id: args.user_id,
        credentials: Credentials {
            client_id: args.client_id,
            client_secret: args.client_secret,
            api_key: args.api_key,
            bearer_token: args.bearer_token,
        },
        custom_auth: args.custom,
    };

    let outcome = connect_toolkit(&client, &key, &request).await?;
    log::info!(
        "{} connection {} ({})",
        outcome.toolkit.name,
        outcome.connection.id,
        outcome.connection.status
    );

    let Some(url) = &outcome.connection.redirect_url else {
        if outcome.connection.status.is_failure() {
            return Err(Error::Custom(format!(
                "Connection {} ended as {}",
                outcome.connection.id, outcome.connection.status
            )));
        }
        println!("{}", outcome.connection.status);
        return Ok(());
    };
    println!("{url}");
    if !args.wait {
        return Ok(());
    }

    log::info!("Open the URL above to authorize; waiting for the connection...");
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let timeout = Duration::from_secs(args.timeout_secs);
    let options = WaitOptions::new(timeout, DEFAULT_POLL_INTERVAL);
    let status =
        wait_for_connection(&client, &key, &outcome.connection.id, options, &cancel).await?;
    match status {
        ConnectionStatus::Active => {
            println!("{status}");
            Ok(())
        }
        ConnectionStatus::TimedOut => Err(ToolkitError::Timeout {
            connection_id: outcome.connection.id,
            waited: timeout,
        }
        .into()),
        other => Err(Error::Custom(format!(
            "Connection {} ended as {other}",
            outcome.connection.id
        ))),
    }
}
