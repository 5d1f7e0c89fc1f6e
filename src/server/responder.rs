use crate::protocol::{write_frame, FrameError, FrameReader, Message, ProtocolError};
use crate::server::monitor::ServerCounters;
use std::io::{Read, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Framing error: {0}")]
    Frame(#[from] FrameError),

    #[error("Failed to encode echo: {0}")]
    Encode(#[from] ProtocolError),
}

pub type Result<T> = std::result::Result<T, ResponderError>;

/// Passive side of the protocol: accepts connections and echoes probes.
///
/// Each accepted connection is served on its own thread; connections share
/// nothing but the counters.
pub struct Responder {
    listener: TcpListener,
    counters: ServerCounters,
    shutdown: Arc<AtomicBool>,
}

impl Responder {
    /// Bind the listening socket without accepting anything yet.
    ///
    /// # Arguments
    ///
    /// * `address` - `host:port` to listen on
    /// * `counters` - Shared activity counters, cloned into every connection
    ///
    /// # Errors
    ///
    /// Returns [`ResponderError::Bind`] when the address is invalid or
    /// already in use.
    pub fn bind(address: &str, counters: ServerCounters) -> Result<Self> {
        let listener = TcpListener::bind(address).map_err(|source| ResponderError::Bind {
            address: address.to_string(),
            source,
        })?;
        debug!(address = address, "Responder bound");

        Ok(Self {
            listener,
            counters,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle that stops [`Responder::serve`] from another thread
    pub fn shutdown_handle(&self) -> Result<ShutdownHandle> {
        let mut wake_addr = self.local_addr()?;
        if wake_addr.ip().is_unspecified() {
            let loopback = match wake_addr.ip() {
                IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
                IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
            };
            wake_addr.set_ip(loopback);
        }

        Ok(ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            wake_addr,
        })
    }

    /// Accept connections until shut down.
    ///
    /// Accept failures are logged and counted; they never stop the loop.
    pub fn serve(self) -> Result<()> {
        info!(address = ?self.listener.local_addr().ok(), "Ready to accept connections and echo probes");

        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::Acquire) {
                debug!("Shutdown requested, leaving accept loop");
                break;
            }

            match stream {
                Ok(stream) => {
                    let counters = self.counters.clone();
                    let spawned = thread::Builder::new()
                        .name("lagline-conn".into())
                        .spawn(move || handle_connection(stream, counters));

                    if let Err(e) = spawned {
                        self.counters.increment_error();
                        error!(error = %e, "Failed to spawn connection thread");
                    }
                }
                Err(e) => {
                    self.counters.increment_error();
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }

        info!("Responder stopped");
        Ok(())
    }
}

/// Wildcard bind address accepting connections on every interface
pub const ALL_INTERFACES: &str = "0.0.0.0";

/// Bind a responder on all interfaces at `port`.
///
/// The returned responder is bound but idle; call [`Responder::serve`] to
/// start answering probes. Port 0 picks an ephemeral port.
pub fn listen(port: u16, counters: ServerCounters) -> Result<Responder> {
    Responder::bind(&format!("{}:{}", ALL_INTERFACES, port), counters)
}

/// Stops a running accept loop
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    wake_addr: SocketAddr,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Release);
        // unblock accept(); the loop sees the flag on this connection
        if let Err(e) = TcpStream::connect_timeout(&self.wake_addr, Duration::from_secs(1)) {
            debug!(error = %e, "Wake-up connection failed");
        }
    }
}

fn handle_connection(stream: TcpStream, counters: ServerCounters) {
    let peer = stream.peer_addr().ok();
    counters.connection_opened();
    info!(peer = ?peer, "Client connected");

    if let Err(e) = stream.set_nodelay(true) {
        warn!(error = %e, peer = ?peer, "Failed to disable Nagle's algorithm");
    }

    let result = stream
        .try_clone()
        .map_err(ResponderError::from)
        .and_then(|reader| {
            let mut writer = stream;
            echo_loop(reader, &mut writer, &counters)
        });

    match result {
        Ok(()) => info!(peer = ?peer, "Client disconnected"),
        Err(e) => {
            counters.increment_error();
            warn!(error = %e, peer = ?peer, "Connection closed after error");
        }
    }

    counters.connection_closed();
}

/// Echo every probe read from `reader` back onto `writer`.
///
/// Returns when the peer closes the stream. Malformed frames are logged,
/// counted and dropped without a reply; framing and I/O errors end the
/// connection.
pub fn echo_loop<R: Read, W: Write>(
    reader: R,
    writer: &mut W,
    counters: &ServerCounters,
) -> Result<()> {
    let mut frames = FrameReader::new(reader);

    while let Some(frame) = frames.read_frame()? {
        let message = match Message::decode(&frame) {
            Ok(message) => message,
            Err(e) => {
                counters.increment_malformed();
                warn!(error = %e, len = frame.len(), "Dropping malformed frame");
                continue;
            }
        };

        match message.echo() {
            Some(echo) => {
                counters.increment_probes();
                write_frame(writer, &echo.encode()?)?;
                counters.increment_echoes();
                debug!(sent_at = %echo.sent_at(), "Echo sent");
            }
            None => {
                debug!(message = ?message, "Ignoring non-probe message");
            }
        }
    }

    Ok(())
}
