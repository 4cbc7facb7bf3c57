use anyhow::Result;
use clap::Parser;
use tracing::error;

use kindred_lib::bootstrap::{init_tracing_subscriber, resolve_config, wire_dependencies};
use kindred_lib::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = resolve_config(cli.config.clone())?;
    let log_dir = config.data_dir.join("logs");
    init_tracing_subscriber(Some(log_dir.as_path()))?;

    let runtime = wire_dependencies(config)?;
    if let Err(err) = runtime.startup.initialize_all().await {
        error!(error = %err, "startup incomplete, continuing as guest");
    }
    runtime.controller.start().await?;

    run(&runtime, cli.command).await
}
