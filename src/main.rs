//! JSON ⇄ SOAP gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                     GATEWAY                      │
//!   POST /RestApi-call │  ┌────────┐   ┌─────────┐   ┌──────────────────┐ │
//!   ───── JSON ────────┼─▶│  http  │──▶│ convert │──▶│ envelope::header │ │
//!                      │  │handler │   │ encode  │   │    validate      │ │
//!                      │  └────────┘   └─────────┘   └────────┬─────────┘ │
//!                      │                                      ▼           │   mutual TLS
//!                      │                               ┌──────────────┐   │   text/xml
//!                      │                               │   upstream   │───┼────────────▶ Backend
//!                      │                               │    client    │◀──┼──────────── API
//!                      │  ┌────────┐   ┌─────────┐     └──────────────┘   │
//!   ◀──── JSON ────────┼──│response│◀──│ convert │◀──────────┘            │
//!                      │  │envelope│   │ decode  │                        │
//!                      │  └────────┘   └─────────┘                        │
//!                      │                                                  │
//!                      │  config · observability · lifecycle              │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use soap_gateway::config::load_config;
use soap_gateway::http::GatewayServer;
use soap_gateway::lifecycle::{signals, Shutdown};
use soap_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "soap-gateway")]
#[command(about = "JSON to SOAP gateway with mutual TLS", long_about = None)]
struct Args {
    /// Optional TOML configuration file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;

    logging::init(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        api_url = %config.upstream.api_url,
        upstream_timeout_secs = config.upstream.timeout_secs,
        accept_invalid_certs = config.upstream.accept_invalid_certs,
        "Configuration loaded"
    );
    if config.upstream.accept_invalid_certs {
        tracing::warn!("Backend certificate verification is disabled");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Successfully HTTP Server is running"
    );

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    tokio::spawn(signals::forward_signals(shutdown));

    GatewayServer::new(config).run(listener, signal).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
