mod cli;
mod config;
mod embedding;
mod error;
mod lore;
mod server;
mod tools;
mod vector;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "grimoire", version, about = "Semantic knowledge MCP server for AI agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (transport from config: stdio or http)
    Serve,
    /// Check connectivity to Qdrant and the embedding endpoint
    Doctor,
    /// Install the built-in system guide chunks that rest() snapshots
    SeedGuides,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = config::GrimoireConfig::load()?;

    // Initialize tracing with the configured log level.
    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => match config.server.transport.as_str() {
            "http" => server::serve_http(config).await?,
            _ => server::serve_stdio(config).await?,
        },
        Command::Doctor => {
            cli::doctor::doctor(&config).await?;
        }
        Command::SeedGuides => {
            cli::seed::seed_guides(&config).await?;
        }
    }

    Ok(())
}
