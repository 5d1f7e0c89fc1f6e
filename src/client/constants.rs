//! Constants used throughout the prober

/// Probes sent per session unless overridden
pub const DEFAULT_PROBE_COUNT: usize = 10;

/// Pause between the echo of one probe and the next probe (milliseconds)
pub const DEFAULT_INTERVAL_MS: u64 = 1_000;

/// How long a probe may wait for its echo (milliseconds)
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;

/// How long the initial connect may take (milliseconds)
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Default endpoint of a local responder
pub const DEFAULT_SERVER: &str = "tcp://127.0.0.1:8080";

/// Only URI scheme understood by the transport
pub const TRANSPORT_SCHEME: &str = "tcp";

/// Progress bar tick interval in milliseconds
pub const PROGRESS_TICK_INTERVAL_MS: u64 = 100;

/// Latency below this is shown in green (milliseconds)
pub const GOOD_LATENCY_MS: f64 = 50.0;

/// Latency below this is shown in yellow, above in red (milliseconds)
pub const ACCEPTABLE_LATENCY_MS: f64 = 150.0;
