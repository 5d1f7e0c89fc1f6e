use crate::client::error::ProberError;
use std::time::Duration;

/// One measured round trip.
///
/// Always the difference of two readings of the prober's own clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Sample(Duration);

impl Sample {
    pub fn new(round_trip: Duration) -> Self {
        Self(round_trip)
    }

    /// Sample from fractional milliseconds; negative input clamps to zero
    pub fn from_millis(millis: f64) -> Self {
        Self(Duration::from_nanos((millis.max(0.0) * 1_000_000.0).round() as u64))
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    pub fn as_millis(&self) -> f64 {
        self.0.as_nanos() as f64 / 1_000_000.0
    }
}

/// Samples of one prober run, in probe order
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    samples: Vec<Sample>,
    target: usize,
}

impl Session {
    pub fn new(target: usize) -> Self {
        Self {
            samples: Vec::with_capacity(target),
            target,
        }
    }

    /// Append the sample of the probe that just completed.
    ///
    /// Samples must arrive in probe order; the prober never pushes more than
    /// `target` of them.
    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of probes the session was meant to send
    pub fn target(&self) -> usize {
        self.target
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.samples.len() == self.target
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}

/// A session that ended early, with whatever it collected before the error
#[derive(Debug)]
pub struct SessionFailure {
    pub session: Session,
    pub error: ProberError,
}

impl SessionFailure {
    pub fn new(session: Session, error: ProberError) -> Self {
        Self { session, error }
    }
}

impl std::fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "session failed after {}/{} probes: {}",
            self.session.len(),
            self.session.target(),
            self.error
        )
    }
}

impl std::error::Error for SessionFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
