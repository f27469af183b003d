//! Configuration for the courier exchange.
//!
//! Supports both command-line arguments and a TOML configuration file.
//! CLI arguments take precedence over config file values.

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;

/// Message buffer size in bytes. The receiver reads at most
/// `MAX_DATA_SIZE - 1` bytes per message.
pub const MAX_DATA_SIZE: usize = 1024;

/// Pending-connection queue capacity for the listening socket.
pub const BACKLOG: i32 = 10;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(version = "0.1.0")]
#[command(about = "A one-request, one-reply TCP exchange", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run an echo server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<String>,

        /// Host to bind; all local interfaces when omitted
        #[arg(long)]
        host: Option<String>,
    },
    /// Send one message and print the reply
    Send {
        /// Host to connect to
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Port to connect to
        #[arg(short, long)]
        port: Option<String>,

        /// The message payload
        message: String,
    },
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: String,
    /// Host to bind; all local interfaces when omitted
    pub host: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: None,
        }
    }
}

/// Exchange-related configuration
#[derive(Debug, Deserialize)]
pub struct ExchangeConfig {
    /// Message buffer size in bytes; a message carries at most one byte less
    #[serde(default = "default_max_data_size")]
    pub max_data_size: usize,
    /// Pending-connection queue capacity
    #[serde(default = "default_backlog")]
    pub backlog: i32,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            max_data_size: default_max_data_size(),
            backlog: default_backlog(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_port() -> String {
    "9034".to_string()
}

fn default_max_data_size() -> usize {
    MAX_DATA_SIZE
}

fn default_backlog() -> i32 {
    BACKLOG
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: Option<String>,
    pub port: String,
    pub max_data_size: usize,
    pub backlog: i32,
    pub log_level: String,
}

impl Config {
    /// Resolve configuration from parsed CLI args and an optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        let (cli_host, cli_port) = match &cli.command {
            Command::Serve { port, host } => (host.clone(), port.clone()),
            Command::Send { port, host, .. } => (Some(host.clone()), port.clone()),
        };

        Ok(Config {
            host: cli_host.or(toml_config.server.host),
            port: cli_port.unwrap_or(toml_config.server.port),
            max_data_size: toml_config.exchange.max_data_size,
            backlog: toml_config.exchange.backlog,
            log_level: if cli.log_level != "info" {
                cli.log_level.clone()
            } else {
                toml_config.logging.level
            },
        })
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
