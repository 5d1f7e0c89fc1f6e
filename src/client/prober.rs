use crate::client::constants::*;
use crate::client::endpoint::Endpoint;
use crate::client::error::{ClientError, ProberError};
use crate::client::session::{Sample, Session, SessionFailure};
use crate::client::transport::{TcpTransport, Transport, TransportError};
use crate::protocol::{Clock, Message, MonotonicClock, Timestamp};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Shape of one probe session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProberConfig {
    pub probe_count: usize,
    /// Pause after each echo before the next probe
    pub interval: Duration,
    /// Deadline for each echo
    pub probe_timeout: Duration,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            probe_count: DEFAULT_PROBE_COUNT,
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
        }
    }
}

impl ProberConfig {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.probe_count == 0 {
            return Err(ClientError::Config("probe count must be > 0".into()));
        }
        if self.probe_timeout.is_zero() {
            return Err(ClientError::Config("probe timeout must be > 0".into()));
        }
        Ok(())
    }
}

/// Active side of the protocol.
///
/// Sends one probe at a time and waits for its echo before the next, so every
/// sample is an isolated round trip.
pub struct Prober<C = MonotonicClock> {
    config: ProberConfig,
    clock: C,
}

impl Prober<MonotonicClock> {
    pub fn new(config: ProberConfig) -> Self {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl<C: Clock> Prober<C> {
    pub fn with_clock(config: ProberConfig, clock: C) -> Self {
        Self { config, clock }
    }

    /// Run a full session over an open transport.
    ///
    /// `on_sample` sees every sample as it is recorded, with its 0-based
    /// index. The first error ends the session; the failure keeps the
    /// samples collected before it. Errors name the probe 1-based.
    ///
    /// # Arguments
    ///
    /// * `transport` - Connected transport; left open for the caller to close
    /// * `on_sample` - Callback invoked after each successful probe
    ///
    /// # Errors
    ///
    /// Fails with [`ProberError::InvalidConfig`] before sending anything when
    /// the config asks for zero probes or a zero timeout.
    pub fn run<T, F>(&self, transport: &mut T, mut on_sample: F) -> Result<Session, SessionFailure>
    where
        T: Transport + ?Sized,
        F: FnMut(usize, Sample),
    {
        let count = self.config.probe_count;
        let mut session = Session::new(count);

        if let Err(e) = self.config.validate() {
            return Err(SessionFailure::new(
                session,
                ProberError::InvalidConfig(e.to_string()),
            ));
        }

        for index in 0..count {
            match self.probe_once(transport, index + 1) {
                Ok(sample) => {
                    debug!(
                        probe = index + 1,
                        latency_ms = sample.as_millis(),
                        "Probe completed"
                    );
                    session.push(sample);
                    on_sample(index, sample);
                }
                Err(error) => {
                    warn!(
                        probe = index + 1,
                        completed = session.len(),
                        error = %error,
                        "Probe session aborted"
                    );
                    return Err(SessionFailure::new(session, error));
                }
            }

            if index + 1 < count && !self.config.interval.is_zero() {
                thread::sleep(self.config.interval);
            }
        }

        info!(probes = session.len(), "Probe session completed");
        Ok(session)
    }

    /// Send probe number `probe` and wait for its echo
    pub fn probe_once<T>(&self, transport: &mut T, probe: usize) -> Result<Sample, ProberError>
    where
        T: Transport + ?Sized,
    {
        let t0 = self.clock.now();
        let sent_at = Timestamp::from_duration(t0);
        let frame = Message::probe(sent_at)
            .encode()
            .map_err(|source| ProberError::Protocol { probe, source })?;

        transport
            .send(&frame)
            .map_err(|e| self.transport_error(probe, e))?;

        let deadline = Instant::now() + self.config.probe_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let frame = transport
                .recv(remaining)
                .map_err(|e| self.transport_error(probe, e))?;
            let t1 = self.clock.now();

            match Message::decode(&frame).map_err(|source| ProberError::Protocol { probe, source })? {
                Message::Echo { sent_at: echoed } => {
                    if echoed != sent_at {
                        warn!(
                            probe = probe,
                            sent = %sent_at,
                            echoed = %echoed,
                            "Echo timestamp differs from probe"
                        );
                    }
                    // own readings only; the echoed value is never subtracted
                    return Ok(Sample::new(t1.saturating_sub(t0)));
                }
                Message::Probe { .. } => {
                    debug!(probe = probe, "Ignoring probe sent by the responder");
                }
            }
        }
    }

    fn transport_error(&self, probe: usize, error: TransportError) -> ProberError {
        match error {
            TransportError::TimedOut => ProberError::ProbeTimeout {
                probe,
                timeout: self.config.probe_timeout,
            },
            TransportError::Closed => ProberError::ConnectionClosed { probe },
            source => ProberError::Transport { probe, source },
        }
    }
}

/// Connect to `endpoint`, run a session, and close the connection.
///
/// The connection is closed whether or not the session succeeded.
pub fn run<F>(
    endpoint: &Endpoint,
    config: &ProberConfig,
    connect_timeout: Duration,
    on_sample: F,
) -> Result<Session, SessionFailure>
where
    F: FnMut(usize, Sample),
{
    if let Err(e) = config.validate() {
        return Err(SessionFailure::new(
            Session::new(config.probe_count),
            ProberError::InvalidConfig(e.to_string()),
        ));
    }

    let mut transport = TcpTransport::connect(endpoint, connect_timeout)
        .map_err(|error| SessionFailure::new(Session::new(config.probe_count), error))?;

    let result = Prober::new(config.clone()).run(&mut transport, on_sample);

    if let Err(e) = transport.close() {
        debug!(error = %e, "Error while closing connection");
    }
    result
}
