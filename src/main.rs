//! thuchi main entry point

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use thuchi_api::start_server;
use thuchi_config::Config;
use thuchi_core::{HttpTransport, Tracker};
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "thuchi")]
#[command(version = "0.1.0")]
#[command(about = "Income and expense tracker backed by an AppSheet table", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print a default configuration file and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = match Config::load(args.config.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.to_details());
            std::process::exit(1);
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!(
        "Config loaded from {}: app={}, table={}",
        args.config.display(),
        config.remote.app_id,
        config.remote.table
    );

    let rt = Runtime::new().context("Failed to start the async runtime")?;

    rt.block_on(async {
        let transport = Arc::new(HttpTransport::new(&config.remote));
        let tracker = Arc::new(Tracker::open(config, transport).await);

        if tracker.is_logged_in() {
            match tracker.refresh().await {
                Ok(count) => log::info!("Initial fetch loaded {} transactions", count),
                Err(e) => log::warn!("Initial fetch failed: {}", e),
            }
        } else {
            log::info!("Waiting for login before fetching data");
        }

        start_server(tracker).await
    })
}
