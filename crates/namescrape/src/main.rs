use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use namescrape::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            roles,
            rules,
            sources,
            classify,
            format,
        } => {
            namescrape::cli::extract::run(&roles, rules.as_deref(), &sources, classify, format)
                .await
        }
        Commands::Sources { rules } => namescrape::cli::sources::run_list(rules.as_deref()),
        Commands::Check { rules } => namescrape::cli::sources::run_check(rules.as_deref()),
    }
}
