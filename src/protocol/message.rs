use crate::protocol::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Milliseconds since the sender's monotonic epoch.
///
/// Only the side that produced a timestamp may subtract from it; the peer's
/// clock has an unrelated epoch.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub f64);

impl Timestamp {
    pub fn from_duration(elapsed: Duration) -> Self {
        Self(elapsed.as_secs_f64() * 1000.0)
    }

    pub fn as_millis(&self) -> f64 {
        self.0
    }

    fn is_valid(&self) -> bool {
        self.0.is_finite() && self.0 >= 0.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}ms", self.0)
    }
}

/// The two frames exchanged between prober and responder.
///
/// Wire form: `{"type":"ping","timestamp":1234.56}` and
/// `{"type":"pong","timestamp":1234.56}`. Frames carrying any other field
/// are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", deny_unknown_fields)]
pub enum Message {
    #[serde(rename = "ping")]
    Probe {
        #[serde(rename = "timestamp")]
        sent_at: Timestamp,
    },
    #[serde(rename = "pong")]
    Echo {
        #[serde(rename = "timestamp")]
        sent_at: Timestamp,
    },
}

impl Message {
    pub fn probe(sent_at: Timestamp) -> Self {
        Message::Probe { sent_at }
    }

    pub fn sent_at(&self) -> Timestamp {
        match self {
            Message::Probe { sent_at } | Message::Echo { sent_at } => *sent_at,
        }
    }

    /// The reply a responder owes for this message, if any.
    ///
    /// A probe is answered with an echo carrying the identical timestamp;
    /// nothing else is answered.
    pub fn echo(&self) -> Option<Message> {
        match *self {
            Message::Probe { sent_at } => Some(Message::Echo { sent_at }),
            Message::Echo { .. } => None,
        }
    }

    /// Serialize to one self-contained frame payload (no trailing newline)
    pub fn encode(&self) -> Result<Vec<u8>> {
        let sent_at = self.sent_at();
        if !sent_at.is_valid() {
            return Err(ProtocolError::MalformedMessage(format!(
                "timestamp must be a finite, non-negative number, got {}",
                sent_at.0
            )));
        }
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let message: Message = serde_json::from_slice(bytes).map_err(|e| {
            debug!(error = %e, len = bytes.len(), "Failed to decode frame");
            ProtocolError::MalformedMessage(e.to_string())
        })?;

        if !message.sent_at().is_valid() {
            return Err(ProtocolError::MalformedMessage(format!(
                "negative timestamp {}",
                message.sent_at().0
            )));
        }

        debug!(message = ?message, "Message decoded successfully");
        Ok(message)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_echo_preserves_timestamp_over_the_wire(millis in 0.0f64..1.0e12) {
            let probe_frame = Message::probe(Timestamp(millis)).encode().unwrap();
            let received = Message::decode(&probe_frame).unwrap();
            let echo_frame = received.echo().unwrap().encode().unwrap();
            let echo = Message::decode(&echo_frame).unwrap();

            let is_echo = matches!(echo, Message::Echo { .. });
            prop_assert!(is_echo);
            prop_assert_eq!(echo.sent_at().0.to_bits(), millis.to_bits());
        }
    }
}
