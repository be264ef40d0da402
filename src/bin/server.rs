//! redikv Server Binary
//!
//! Starts the TCP server for redikv.

use std::sync::Arc;

use clap::Parser;
use redikv::network::Server;
use redikv::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// redikv Server
#[derive(Parser, Debug)]
#[command(name = "redikv-server")]
#[command(about = "Minimal in-memory key-value store")]
#[command(version)]
struct Args {
    /// Interface to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Enable diagnostic logging
    #[arg(short, long)]
    debug: bool,

    /// Worker threads serving connections
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Maximum connections queued for a worker
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Omit the value-length field in GET responses (for old clients)
    #[arg(long)]
    legacy_framing: bool,
}

fn main() {
    let args = Args::parse();

    // Initialize tracing/logging; RUST_LOG wins over --debug
    let default_filter = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    tracing::info!("redikv Server v{}", redikv::VERSION);

    // Build config from args
    let config = Config::builder()
        .bind_host(&args.host)
        .port(args.port)
        .workers(args.workers)
        .max_connections(args.max_connections)
        .length_prefixed_values(!args.legacy_framing)
        .debug_enabled(args.debug)
        .on_server_error(|e| tracing::error!("Listener fault: {}", e))
        .build();

    tracing::debug!("Config: {:?}", config);

    let engine = Arc::new(Engine::with_config(&config));

    let server = match Server::bind(config, engine) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
