//! courier: a one-request, one-reply TCP exchange
//!
//! `courier serve` runs an echo server; `courier send` performs a single
//! exchange and prints the reply. Configuration comes from CLI arguments
//! or a TOML file.

use clap::Parser;
use courier::config::{CliArgs, Command, Config};
use courier::{client, server};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = CliArgs::parse();

    // Load configuration
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Command::Serve { .. } => run_server(config).await,
        Command::Send { message, .. } => run_client(config, message).await,
    }
}

/// Run an echo server until the process is terminated.
async fn run_server(config: Config) {
    info!(
        host = config.host.as_deref().unwrap_or("*"),
        port = %config.port,
        max_data_size = config.max_data_size,
        backlog = config.backlog,
        "starting courier server"
    );

    let listener =
        match server::bind_listener(config.host.as_deref(), &config.port, config.backlog).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(error = %e, "server setup failed");
                std::process::exit(1);
            }
        };

    server::accept_loop(
        listener,
        |message: &[u8]| message.to_vec(),
        config.max_data_size - 1,
    )
    .await;
}

/// Perform one exchange and print the reply.
async fn run_client(config: Config, message: String) {
    let host = config.host.as_deref().unwrap_or("localhost");

    match client::exchange(
        host,
        &config.port,
        message.as_bytes(),
        config.max_data_size - 1,
    )
    .await
    {
        Ok(reply) => println!("{}", String::from_utf8_lossy(&reply)),
        Err(e) => {
            error!(error = %e, "exchange failed");
            std::process::exit(1);
        }
    }
}
