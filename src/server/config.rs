//! Server configuration module
//!
//! Provides CLI argument parsing and validation for the Lagline responder.

use crate::logging::validate_log_level;
use clap::Parser;
use tracing::debug;

#[derive(Parser, Debug, Clone)]
#[command(name = "lagline-server")]
#[command(about = "Latency probe responder: echoes every ping it receives")]
pub struct ServerConfig {
    /// Bind address
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Bind port
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Status line update interval in milliseconds
    #[arg(long, default_value_t = 100)]
    pub update_interval: u64,

    /// Disable the terminal status line (useful for Docker/systemd)
    #[arg(long)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,
}

impl ServerConfig {
    /// Returns the full bind address as a string (bind:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn validate(&self) -> Result<(), String> {
        debug!("Validating server configuration");

        if self.port == 0 {
            return Err("port must be > 0".into());
        }

        if self.update_interval == 0 {
            return Err("update_interval must be > 0".into());
        }

        validate_log_level(&self.log_level)?;

        debug!("Server configuration validated successfully");
        Ok(())
    }

    pub fn is_json_format(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}
