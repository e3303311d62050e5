use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cloudclip::bootstrap::{init_tracing_subscriber, resolve_config, wire_dependencies};

#[derive(Parser, Debug)]
#[command(name = "cloudclip")]
#[command(version, about = "Cloud clipboard history with live sync", long_about = None)]
struct Cli {
    /// Path to a TOML config file (default: $CONFIG_DIR/cloudclip/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = resolve_config(cli.config)?;
    init_tracing_subscriber(&config)?;
    info!(?config, "Configuration loaded");

    let (wired, notifications) = wire_dependencies(&config)?;
    cloudclip::shell::run(wired, notifications).await
}
