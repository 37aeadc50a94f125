use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cmh",
    version,
    about = "Codemode hub: an MCP gateway exposing capability search and sandboxed execution over a backend fleet"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the gateway tools over stdio (JSON-RPC 2.0).
    Serve {
        /// Path to the gateway configuration file.
        #[arg(long, default_value = "codemode.toml")]
        config: PathBuf,
    },
    /// Check the configuration file and exit.
    Validate {
        /// Path to the gateway configuration file.
        #[arg(long, default_value = "codemode.toml")]
        config: PathBuf,
    },
}
