use anyhow::Result;
use clap::Parser;

mod cli;
mod server;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the JSON-RPC stream.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { config } => server::run_gateway(&config).await,
        Commands::Validate { config } => validate_config(&config),
    }
}

fn validate_config(path: &std::path::Path) -> Result<()> {
    let config = cmh_config::GatewayConfig::load(path)?;
    println!("{}: OK ({} servers)", path.display(), config.servers.len());
    for server in &config.servers {
        println!("  {} ({})", server.name, server.transport.label());
    }
    Ok(())
}
