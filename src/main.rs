//! nameprompt - SSH-accessible name prompt
//!
//! Listens on 0.0.0.0:3000 and runs the prompt for each session until
//! SIGINT or SIGTERM.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{error, info};

use nameprompt::config::Config;
use nameprompt::ssh::{self, ServeError};
use nameprompt::{host_key, signal};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nameprompt=info".parse()?),
        )
        .init();

    let config = Arc::new(Config::default());

    // Startup failures are logged, not propagated
    if let Err(e) = run(config).await {
        error!(error = %format!("{:#}", e), "could not start server");
    }

    Ok(())
}

async fn run(config: Arc<Config>) -> Result<()> {
    let key = host_key::load_or_generate(&config.host_key_path)?;

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "starting SSH server");

    match ssh::serve(config, key, listener, signal::shutdown_signal()).await {
        Ok(()) => info!("SSH server stopped"),
        Err(e @ ServeError::Serve(_)) => error!(error = %e, "could not start server"),
        Err(e) => error!(error = %e, "could not stop server"),
    }

    Ok(())
}
