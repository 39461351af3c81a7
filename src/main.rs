//! cdel - Azure Blob Storage container lifecycle CLI
//!
//! Runs the create / delete / soft-delete / undelete sequence against a
//! storage account, or any single step of it.

use clap::Parser;
use container_lifecycle::cli::Cli;
use container_lifecycle::config;
use container_lifecycle::Result;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // A missing .env file is not an error
    dotenv::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize logging
    let debug = cli.debug
        || std::env::var("DEBUG")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);
    init_logging(debug);

    let reports_done = cli.command().reports_done();

    // Failures are reported on stdout; the exit status stays zero
    match run(cli).await {
        Ok(()) => {
            if reports_done {
                println!("done");
            }
        }
        Err(e) => {
            error!("Error: {}", e);
            println!("error: {}", e);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Starting cdel");

    // Connection string requirements are checked by the commands that need one
    let config = config::load_config().await?;

    cli.execute(config).await
}

fn init_logging(debug: bool) {
    let default_filter = if debug {
        "container_lifecycle=debug,cdel=debug"
    } else {
        "container_lifecycle=info,cdel=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
