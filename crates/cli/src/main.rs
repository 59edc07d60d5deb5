//! CLI entry point for create-asset.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ledger_cli::{CliConfig, Command};
use ledger_session::{SessionManager, TcpConnector};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = CliConfig::parse();
    let command = Command::from_config(&config).await.map_err(|e| {
        tracing::error!(kind = %e.kind(), error = %e, "invalid invocation");
        let kind = e.kind();
        anyhow::Error::new(e).context(format!("cannot prepare invocation [{}]", kind))
    })?;

    let manager = SessionManager::new(Arc::new(TcpConnector::new()));
    let outcome = command
        .run(manager)
        .await
        .context("create-asset did not complete")?;

    println!("{}", outcome.entity);
    tracing::info!(elapsed = ?outcome.elapsed, "program complete");
    Ok(())
}
