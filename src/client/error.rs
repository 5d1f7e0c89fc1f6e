use crate::client::transport::TransportError;
use crate::protocol::ProtocolError;
use std::time::Duration;
use thiserror::Error;

/// Errors that end a probe session.
///
/// `probe` is the 1-based number of the probe that was in flight.
#[derive(Debug, Error)]
pub enum ProberError {
    #[error("{0}")]
    InvalidConfig(String),

    #[error("Invalid endpoint address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to connect to {address}: {source}")]
    Connection {
        address: String,
        source: std::io::Error,
    },

    #[error("Probe {probe}: no echo within {}ms", .timeout.as_millis())]
    ProbeTimeout { probe: usize, timeout: Duration },

    #[error("Probe {probe}: connection closed by peer")]
    ConnectionClosed { probe: usize },

    #[error("Probe {probe}: {source}")]
    Protocol { probe: usize, source: ProtocolError },

    #[error("Probe {probe}: {source}")]
    Transport { probe: usize, source: TransportError },
}

impl ProberError {
    /// Number of the probe that failed, if the session got that far
    pub fn probe(&self) -> Option<usize> {
        match self {
            ProberError::InvalidConfig(_)
            | ProberError::InvalidAddress { .. }
            | ProberError::Connection { .. } => None,
            ProberError::ProbeTimeout { probe, .. }
            | ProberError::ConnectionClosed { probe }
            | ProberError::Protocol { probe, .. }
            | ProberError::Transport { probe, .. } => Some(*probe),
        }
    }
}

/// Misuse of the statistics reducer
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsError {
    #[error("Cannot summarize an empty set of samples")]
    EmptyInput,
}

/// Client-side errors outside a probe session
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Progress display error: {0}")]
    Progress(String),

    #[error("Failed to render report: {0}")]
    Report(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
