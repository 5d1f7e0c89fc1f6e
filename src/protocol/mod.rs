//! Protocol module for Lagline

pub mod clock;
pub mod error;
pub mod frame;
pub mod message;

pub use clock::{Clock, MonotonicClock};
pub use error::{FrameError, ProtocolError, Result as ProtocolResult};
pub use frame::{write_frame, FrameReader, MAX_FRAME_LEN};
pub use message::{Message, Timestamp};
