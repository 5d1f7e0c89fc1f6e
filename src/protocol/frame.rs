//! Newline-delimited framing over a reliable byte stream.
//!
//! Each frame carries exactly one encoded [`Message`](super::Message). The
//! codec never emits a raw newline inside a payload, so `\n` is a safe
//! terminator.

use crate::protocol::error::FrameError;
use std::io::{self, BufRead, BufReader, ErrorKind, Read, Write};
use std::time::{Duration, Instant};
use tracing::debug;

/// Upper bound for a single frame payload in bytes
pub const MAX_FRAME_LEN: usize = 4096;

const FRAME_TERMINATOR: u8 = b'\n';

/// Splits an incoming byte stream into frames.
///
/// Bytes of a partially received frame are kept across calls, so a read that
/// fails with a timeout can be retried without losing data.
pub struct FrameReader<R> {
    inner: BufReader<R>,
    pending: Vec<u8>,
    max_len: usize,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_limit(inner, MAX_FRAME_LEN)
    }

    pub fn with_limit(inner: R, max_len: usize) -> Self {
        Self {
            inner: BufReader::new(inner),
            pending: Vec::new(),
            max_len,
        }
    }

    /// Read the next frame payload.
    ///
    /// Returns `Ok(None)` on a clean end of stream between frames.
    pub fn read_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        loop {
            if let Some(outcome) = self.step()? {
                return Ok(outcome);
            }
        }
    }

    /// Read the next frame payload, giving up once `deadline` passes.
    ///
    /// A byte stream that trickles data without ever finishing a frame would
    /// otherwise keep [`read_frame`](Self::read_frame) alive for as long as
    /// each single read stays under the socket timeout.
    ///
    /// # Arguments
    ///
    /// * `deadline` - Instant after which no further read is attempted
    /// * `arm` - Called with the time left before every read that may block,
    ///   typically to set the socket read timeout
    ///
    /// # Errors
    ///
    /// Fails with a timed-out [`FrameError::Io`] once the deadline passes;
    /// the bytes received so far stay buffered for the next call.
    pub fn read_frame_until<F>(
        &mut self,
        deadline: Instant,
        mut arm: F,
    ) -> Result<Option<Vec<u8>>, FrameError>
    where
        F: FnMut(Duration) -> io::Result<()>,
    {
        loop {
            // buffered bytes are parsed without touching the stream
            if self.inner.buffer().is_empty() {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    debug!(pending = self.pending.len(), "Frame deadline elapsed");
                    return Err(FrameError::Io(io::Error::from(ErrorKind::TimedOut)));
                }
                arm(remaining)?;
            }

            if let Some(outcome) = self.step()? {
                return Ok(outcome);
            }
        }
    }

    /// One fill of the buffer; `None` means the frame is still incomplete
    fn step(&mut self) -> Result<Option<Option<Vec<u8>>>, FrameError> {
        let available = match self.inner.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == ErrorKind::Interrupted => return Ok(None),
            Err(e) => return Err(FrameError::Io(e)),
        };

        if available.is_empty() {
            if self.pending.is_empty() {
                return Ok(Some(None));
            }
            return Err(FrameError::Truncated {
                pending: self.pending.len(),
            });
        }

        match available.iter().position(|&b| b == FRAME_TERMINATOR) {
            Some(pos) => {
                if self.pending.len() + pos > self.max_len {
                    return Err(FrameError::TooLarge {
                        limit: self.max_len,
                    });
                }
                self.pending.extend_from_slice(&available[..pos]);
                self.inner.consume(pos + 1);

                let frame = std::mem::take(&mut self.pending);
                debug!(len = frame.len(), "Frame received");
                Ok(Some(Some(frame)))
            }
            None => {
                let len = available.len();
                self.pending.extend_from_slice(available);
                self.inner.consume(len);
                if self.pending.len() > self.max_len {
                    return Err(FrameError::TooLarge {
                        limit: self.max_len,
                    });
                }
                Ok(None)
            }
        }
    }
}

/// Write one frame payload followed by the terminator and flush
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError> {
    let mut frame = Vec::with_capacity(payload.len() + 1);
    frame.extend_from_slice(payload);
    frame.push(FRAME_TERMINATOR);
    writer.write_all(&frame)?;
    writer.flush()?;
    debug!(len = payload.len(), "Frame sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Yields its chunks one read at a time, failing with `WouldBlock` once
    /// between them, like a socket whose read timeout fired.
    struct ChunkedReader {
        chunks: Vec<Vec<u8>>,
        stall: bool,
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.stall {
                self.stall = false;
                return Err(io::Error::from(ErrorKind::WouldBlock));
            }
            if self.chunks.is_empty() {
                return Ok(0);
            }
            let chunk = self.chunks.remove(0);
            buf[..chunk.len()].copy_from_slice(&chunk);
            self.stall = true;
            Ok(chunk.len())
        }
    }

    #[test]
    fn test_reads_consecutive_frames() -> Result<(), FrameError> {
        let mut reader = FrameReader::new(Cursor::new(b"first\nsecond\n".to_vec()));
        assert_eq!(reader.read_frame()?, Some(b"first".to_vec()));
        assert_eq!(reader.read_frame()?, Some(b"second".to_vec()));
        assert_eq!(reader.read_frame()?, None);
        Ok(())
    }

    #[test]
    fn test_partial_frame_survives_timeout() -> Result<(), FrameError> {
        let mut reader = FrameReader::new(ChunkedReader {
            chunks: vec![b"{\"type\":".to_vec(), b"\"ping\"}\n".to_vec()],
            stall: false,
        });

        // first chunk is buffered, then the stall surfaces as a timeout
        let err = reader.read_frame().unwrap_err();
        assert!(err.is_timeout());

        assert_eq!(reader.read_frame()?, Some(b"{\"type\":\"ping\"}".to_vec()));
        Ok(())
    }

    #[test]
    fn test_expired_deadline_stops_before_reading() {
        let mut reader = FrameReader::new(Cursor::new(b"late\n".to_vec()));
        let mut armed = 0;
        let err = reader
            .read_frame_until(Instant::now(), |_| {
                armed += 1;
                Ok(())
            })
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(armed, 0);
    }

    #[test]
    fn test_deadline_read_arms_before_each_blocking_read() -> Result<(), FrameError> {
        let mut reader = FrameReader::new(ChunkedReader {
            chunks: vec![b"one\ntw".to_vec(), b"o\n".to_vec()],
            stall: false,
        });
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut arms = Vec::new();
        let mut arm = |remaining: Duration| -> io::Result<()> {
            arms.push(remaining);
            Ok(())
        };

        assert_eq!(reader.read_frame_until(deadline, &mut arm)?, Some(b"one".to_vec()));
        // "tw" is still buffered, so it is parsed before the stalled read
        assert!(reader.read_frame_until(deadline, &mut arm).unwrap_err().is_timeout());
        assert_eq!(reader.read_frame_until(deadline, &mut arm)?, Some(b"two".to_vec()));

        assert_eq!(arms.len(), 3);
        assert!(arms.iter().all(|r| *r <= Duration::from_secs(5)));
        Ok(())
    }

    #[test]
    fn test_eof_mid_frame_is_truncated() {
        let mut reader = FrameReader::new(Cursor::new(b"abc".to_vec()));
        assert!(matches!(
            reader.read_frame(),
            Err(FrameError::Truncated { pending: 3 })
        ));
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut reader = FrameReader::with_limit(Cursor::new(vec![b'x'; 64]), 16);
        assert!(matches!(
            reader.read_frame(),
            Err(FrameError::TooLarge { limit: 16 })
        ));
    }

    #[test]
    fn test_write_frame_appends_terminator() -> Result<(), FrameError> {
        let mut out = Vec::new();
        write_frame(&mut out, b"payload")?;
        assert_eq!(out, b"payload\n");
        Ok(())
    }
}
