//! FarmeRice backend server
//!
//! REST API for the FarmeRice marketplace, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────────┐
//!                         │                  FARMERICE BACKEND                    │
//!                         │                                                       │
//!     Client Request      │  ┌─────────────┐   ┌──────────────┐   ┌───────────┐  │
//!     ────────────────────┼─▶│ middleware  │──▶│   routing    │──▶│  storage  │  │
//!                         │  │ id/trace/   │   │ /api/<res>   │   │ documents │  │
//!                         │  │ cors/limit  │   │ /api/upload  │   │ (sqlite)  │  │
//!                         │  └─────────────┘   └──────┬───────┘   └───────────┘  │
//!                         │                           │                           │
//!     Client Response     │  ┌─────────────┐          │  /health  /uploads        │
//!     ◀───────────────────┼──│ error.rs    │◀─────────┘  /public  frontend (prod) │
//!                         │  │ JSON errors │                                      │
//!                         │  └─────────────┘                                      │
//!                         │                                                       │
//!                         │  Cross-cutting: config, observability, lifecycle      │
//!                         └──────────────────────────────────────────────────────┘
//! ```
//!
//! Exit codes: 0 after a requested shutdown, 1 on startup failure or crash.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use farmerice::config::load_config;
use farmerice::lifecycle::{crash, signals, startup};
use farmerice::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "farmerice", version, about = "FarmeRice e-commerce backend")]
struct Cli {
    /// Path to a TOML config file (defaults to ./farmerice.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to a dotenv file (defaults to ./.env when present)
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let dotenv = match &cli.env_file {
        Some(path) => dotenvy::from_path(path).map(|_| ()),
        None => dotenvy::dotenv().map(|_| ()),
    };
    if let (Some(path), Err(e)) = (&cli.env_file, &dotenv) {
        eprintln!("Failed to load env file {}: {e}", path.display());
        return ExitCode::FAILURE;
    }

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config);
    crash::install_panic_hook();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        port = config.server.port,
        "farmerice starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let outcome = startup::launch(config, signals::wait_for_termination()).await;
    tracing::info!(code = outcome.code(), "farmerice exiting");

    // Blocking tasks still parked in the runtime must not delay the exit.
    std::process::exit(outcome.code())
}
