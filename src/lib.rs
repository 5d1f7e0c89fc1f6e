//! Lagline - round-trip latency probe over a persistent framed connection
//!
//! One side runs a passive responder that echoes every probe it receives;
//! the other opens a single connection, sends a fixed number of timed probes
//! one at a time, and reduces the measured round trips to average/min/max.

pub mod client;
pub mod logging;
pub mod protocol;
pub mod server;
