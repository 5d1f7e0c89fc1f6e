//! Server module for the Lagline responder

pub mod config;
pub mod monitor;
pub mod responder;

pub use config::ServerConfig;
pub use monitor::{ServerCounters, ServerMonitor, ServerStats};
pub use responder::{
    echo_loop, listen, Responder, ResponderError, ShutdownHandle, ALL_INTERFACES,
};
