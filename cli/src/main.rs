use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;
mod runtime;
pub mod ux_error;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = runtime::load_config(cli.config.as_deref())?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level))
        )
        .init();

    let runtime = runtime::Runtime::open(config, cli.offline).await?;
    let result = commands::run(cli.command, &runtime, cli.json).await;
    runtime.manager.shutdown().await;
    result
}
