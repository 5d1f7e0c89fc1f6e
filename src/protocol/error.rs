use thiserror::Error;

/// Protocol-level errors for message encoding/decoding and framing
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors raised while splitting a byte stream into frames
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Connection closed in the middle of a frame ({pending} bytes pending)")]
    Truncated { pending: usize },
}

impl FrameError {
    /// True when the underlying read gave up because its timeout elapsed
    pub fn is_timeout(&self) -> bool {
        match self {
            FrameError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
