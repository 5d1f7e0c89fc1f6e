//! Responder activity counters and terminal status line

use colored::*;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Time without probes before the status line shows IDLE (milliseconds)
const IDLE_THRESHOLD_MS: u64 = 1_500;

#[derive(Debug, Default)]
struct Counters {
    connections_total: AtomicU64,
    connections_active: AtomicU64,
    probes_received: AtomicU64,
    echoes_sent: AtomicU64,
    malformed_frames: AtomicU64,
    errors: AtomicU64,
}

/// Monitor for the responder with minimal impact on the echo path.
///
/// Connection threads only touch atomic counters; rendering happens in a
/// background thread started by [`ServerMonitor::start_display`].
pub struct ServerMonitor {
    counters: Arc<Counters>,
    start_time: Instant,
    update_interval: Duration,
}

impl ServerMonitor {
    /// Create a monitor with zeroed counters.
    ///
    /// # Arguments
    ///
    /// * `update_interval_ms` - How often the status line is redrawn once
    ///   [`start_display`](Self::start_display) runs. Counters are updated
    ///   on every event regardless of this value.
    pub fn new(update_interval_ms: u64) -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            start_time: Instant::now(),
            update_interval: Duration::from_millis(update_interval_ms),
        }
    }

    /// Handle for connection threads to record activity
    pub fn counters(&self) -> ServerCounters {
        ServerCounters {
            inner: Arc::clone(&self.counters),
        }
    }

    /// Start the background status line thread.
    ///
    /// The thread lives until process exit.
    pub fn start_display(&self) {
        let counters = Arc::clone(&self.counters);
        let update_interval = self.update_interval;

        thread::spawn(move || {
            let mut last_probes = 0u64;
            let mut last_probe_time: Option<Instant> = None;

            loop {
                thread::sleep(update_interval);

                let snapshot = ServerStats::from_counters(&counters, Duration::ZERO);
                let now = Instant::now();

                if snapshot.probes_received > last_probes {
                    last_probe_time = Some(now);
                    last_probes = snapshot.probes_received;
                }

                let is_idle = last_probe_time.map_or(true, |t| {
                    now.duration_since(t) >= Duration::from_millis(IDLE_THRESHOLD_MS)
                });

                Self::display_status_line(is_idle, &snapshot);
            }
        });
    }

    fn render_indicator(is_idle: bool) -> String {
        if is_idle {
            "○".normal().to_string()
        } else {
            "●".green().bold().to_string()
        }
    }

    fn display_status_line(is_idle: bool, stats: &ServerStats) {
        let status = if is_idle { "IDLE" } else { "ACTIVE" };
        print!(
            "\r{} [{}] Clients: {} ({} total) | Probes: {} | Echoes: {} | Malformed: {} | Errors: {}",
            Self::render_indicator(is_idle),
            status,
            stats.connections_active,
            stats.connections_total,
            stats.probes_received,
            stats.echoes_sent,
            stats.malformed_frames,
            stats.errors
        );
        std::io::stdout().flush().ok();
    }

    /// Snapshot of all counters
    pub fn stats(&self) -> ServerStats {
        ServerStats::from_counters(&self.counters, self.start_time.elapsed())
    }
}

/// Cheap cloneable handle onto the monitor's counters.
///
/// `Relaxed` ordering is enough: counters are independent and only read
/// for display.
#[derive(Debug, Clone)]
pub struct ServerCounters {
    inner: Arc<Counters>,
}

impl ServerCounters {
    /// Counters not attached to any display
    pub fn detached() -> Self {
        Self {
            inner: Arc::new(Counters::default()),
        }
    }

    #[inline]
    pub fn connection_opened(&self) {
        self.inner.connections_total.fetch_add(1, Ordering::Relaxed);
        self.inner.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn connection_closed(&self) {
        self.inner.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_probes(&self) {
        self.inner.probes_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_echoes(&self) {
        self.inner.echoes_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_malformed(&self) {
        self.inner.malformed_frames.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_error(&self) {
        self.inner.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ServerStats {
        ServerStats::from_counters(&self.inner, Duration::ZERO)
    }
}

/// Point-in-time responder statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerStats {
    pub connections_total: u64,
    pub connections_active: u64,
    pub probes_received: u64,
    pub echoes_sent: u64,
    pub malformed_frames: u64,
    pub errors: u64,
    pub elapsed: Duration,
}

impl ServerStats {
    fn from_counters(counters: &Counters, elapsed: Duration) -> Self {
        Self {
            connections_total: counters.connections_total.load(Ordering::Relaxed),
            connections_active: counters.connections_active.load(Ordering::Relaxed),
            probes_received: counters.probes_received.load(Ordering::Relaxed),
            echoes_sent: counters.echoes_sent.load(Ordering::Relaxed),
            malformed_frames: counters.malformed_frames.load(Ordering::Relaxed),
            errors: counters.errors.load(Ordering::Relaxed),
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_creation() {
        let monitor = ServerMonitor::new(100);
        assert_eq!(monitor.update_interval, Duration::from_millis(100));
        assert_eq!(monitor.stats().probes_received, 0);
    }

    #[test]
    fn test_counters_are_shared_with_monitor() {
        let monitor = ServerMonitor::new(100);
        let counters = monitor.counters();
        let cloned = counters.clone();

        counters.connection_opened();
        cloned.connection_opened();
        cloned.connection_closed();
        counters.increment_probes();
        counters.increment_echoes();
        cloned.increment_malformed();
        cloned.increment_error();

        let stats = monitor.stats();
        assert_eq!(stats.connections_total, 2);
        assert_eq!(stats.connections_active, 1);
        assert_eq!(stats.probes_received, 1);
        assert_eq!(stats.echoes_sent, 1);
        assert_eq!(stats.malformed_frames, 1);
        assert_eq!(stats.errors, 1);
    }

    #[test]
    fn test_detached_counters_snapshot() {
        let counters = ServerCounters::detached();
        counters.increment_probes();
        assert_eq!(counters.snapshot().probes_received, 1);
    }
}
