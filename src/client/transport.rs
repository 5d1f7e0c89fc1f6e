use crate::client::endpoint::Endpoint;
use crate::client::error::ProberError;
use crate::protocol::{write_frame, FrameError, FrameReader};
use std::io::{self, ErrorKind};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Timed out waiting for a frame")]
    TimedOut,

    #[error("Connection closed by peer")]
    Closed,

    #[error("Framing error: {0}")]
    Frame(FrameError),

    #[error("Network I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<FrameError> for TransportError {
    fn from(e: FrameError) -> Self {
        if e.is_timeout() {
            return TransportError::TimedOut;
        }
        match e {
            FrameError::Io(io) if is_disconnect(&io) => TransportError::Closed,
            other => TransportError::Frame(other),
        }
    }
}

fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof
    )
}

/// Message-oriented, full-duplex connection carrying one frame per message
pub trait Transport {
    /// Send one frame payload
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    /// Wait up to `timeout` for the next frame payload.
    ///
    /// A peer close surfaces as [`TransportError::Closed`], never as a hang.
    fn recv(&mut self, timeout: Duration) -> Result<Vec<u8>, TransportError>;

    /// Close both directions of the connection
    fn close(&mut self) -> Result<(), TransportError>;
}

/// Newline-framed TCP implementation of [`Transport`]
pub struct TcpTransport {
    reader: FrameReader<TcpStream>,
    writer: TcpStream,
    peer: SocketAddr,
}

impl TcpTransport {
    /// Connect to the first reachable address of `endpoint`.
    ///
    /// Every resolved address is tried in order, each with the full
    /// `timeout`; Nagle's algorithm is disabled on the connected socket.
    ///
    /// # Errors
    ///
    /// Returns [`ProberError::Connection`] carrying the last attempt's error
    /// when no address accepts.
    pub fn connect(endpoint: &Endpoint, timeout: Duration) -> Result<Self, ProberError> {
        let mut last_error = None;

        for addr in endpoint.addrs() {
            debug!(addr = %addr, timeout_ms = timeout.as_millis(), "Connecting");
            match TcpStream::connect_timeout(addr, timeout).and_then(Self::from_stream) {
                Ok(transport) => {
                    info!(peer = %addr, "Connected to responder");
                    return Ok(transport);
                }
                Err(e) => {
                    warn!(addr = %addr, error = %e, "Connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(ProberError::Connection {
            address: endpoint.to_string(),
            source: last_error
                .unwrap_or_else(|| io::Error::new(ErrorKind::NotFound, "no addresses to try")),
        })
    }

    pub fn from_stream(stream: TcpStream) -> io::Result<Self> {
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: FrameReader::new(stream),
            writer,
            peer,
        })
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        write_frame(&mut self.writer, frame).map_err(TransportError::from)
    }

    fn recv(&mut self, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        // never armed with zero, which the OS reads as "block forever"
        let deadline = Instant::now() + timeout;
        let socket = &self.writer;
        // SO_RCVTIMEO is per socket, shared with the reader's handle, and
        // restarts on every read, so it is re-armed with what is left
        let frame = self
            .reader
            .read_frame_until(deadline, |remaining| socket.set_read_timeout(Some(remaining)))?;

        match frame {
            Some(frame) => Ok(frame),
            None => Err(TransportError::Closed),
        }
    }

    fn close(&mut self) -> Result<(), TransportError> {
        debug!(peer = %self.peer, "Closing connection");
        match self.writer.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}


#[cfg(test)]
pub use tests::MockTransport;
