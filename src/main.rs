//! API Gateway
//!
//! Edge component in front of the records and log services.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 API GATEWAY                  │
//!                      │                                              │
//!   Client Request     │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!   ───────────────────┼─▶│  http   │───▶│ routing  │───▶│ forward │──┼──▶ Records / Log
//!                      │  │ server  │    │  table   │    │ engine  │  │    backend
//!                      │  └─────────┘    └──────────┘    └────┬────┘  │
//!   Client Response    │                                      │       │
//!   ◀──────────────────┼──────────────── relay ◀──────────────┤       │
//!                      │                                      ▼       │
//!                      │                               ┌───────────┐  │
//!                      │                               │   audit   │──┼──▶ POST /logs
//!                      │                               │ (detached)│  │    (best effort)
//!                      │                               └───────────┘  │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use api_gateway::config::load_config;
use api_gateway::lifecycle::{signals, startup, Shutdown};
use api_gateway::observability::logging;
use api_gateway::RouteTable;

#[derive(Parser)]
#[command(name = "api-gateway")]
#[command(about = "Routes /service and /logs to the records and log backends", long_about = None)]
struct Cli {
    /// TOML configuration file. Environment variables override it.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Print the resolved route table and exit.
    #[arg(long)]
    print_routes: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    if cli.print_routes {
        let table = RouteTable::gateway(&config.backends)?;
        for route in table.routes() {
            println!("{:<7} {:<14} -> {}", route.method().as_str(), route.inbound().as_str(), route.outbound_template());
        }
        return Ok(());
    }

    logging::init_logging(&config.observability)?;

    tracing::info!("api-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    startup::run(config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
