use crate::client::constants::*;
use crate::client::error::{ClientError, Result};
use crate::client::prober::ProberConfig;
use crate::logging::validate_log_level;
use clap::{Parser, ValueEnum};
use std::time::Duration;
use tracing::debug;

/// What to do with samples collected before a session failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PartialPolicy {
    /// Summarize the samples that were collected
    Report,
    /// Only report the failure
    Discard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "lagline-client")]
#[command(about = "Measure round-trip latency to a lagline responder")]
pub struct Config {
    /// Responder address (tcp://host:port or host:port)
    #[arg(long, default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Number of probes to send
    #[arg(long, default_value_t = DEFAULT_PROBE_COUNT)]
    pub count: usize,

    /// Delay between probes in milliseconds
    #[arg(long, default_value_t = DEFAULT_INTERVAL_MS)]
    pub interval_ms: u64,

    /// How long to wait for each echo in milliseconds
    #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Connect timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_MS)]
    pub connect_timeout_ms: u64,

    /// Whether a failed session still reports the samples it collected
    #[arg(long, value_enum, default_value_t = PartialPolicy::Discard)]
    pub partial: PartialPolicy,

    /// Result format written to stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Disable the live progress display
    #[arg(long)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,
}

impl Config {
    pub fn prober_config(&self) -> ProberConfig {
        ProberConfig {
            probe_count: self.count,
            interval: Duration::from_millis(self.interval_ms),
            probe_timeout: Duration::from_millis(self.timeout_ms),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn is_json_format(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");
        self.prober_config().validate()?;
        if self.connect_timeout_ms == 0 {
            return Err(ClientError::Config("connect timeout must be > 0".into()));
        }
        validate_log_level(&self.log_level).map_err(ClientError::Config)?;
        debug!("Configuration validated successfully");
        Ok(())
    }
}
