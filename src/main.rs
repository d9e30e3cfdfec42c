use std::sync::Arc;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use deepread::{
    cli::{execute_command, Cli},
    config::{Config, LogFormat},
    pipeline::Analyzer,
    store::SqliteStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    debug!(version = env!("CARGO_PKG_VERSION"), "deepread starting");

    // Initialize local store
    let store = match SqliteStore::new(&config.database).await {
        Ok(s) => {
            debug!(path = %config.database.path.display(), "Local store opened");
            s
        }
        Err(e) => {
            error!(error = %e, "Failed to open local store");
            return Err(e.into());
        }
    };

    let mut analyzer = Analyzer::from_config(&config, Arc::new(store)).await?;

    let result = execute_command(cli.command, &mut analyzer).await;
    if result.exit_code == 0 {
        println!("{}", result.message);
    } else {
        eprintln!("{}", result.message);
        std::process::exit(result.exit_code);
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
