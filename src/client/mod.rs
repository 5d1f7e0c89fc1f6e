//! Client module for the Lagline prober

pub mod config;
pub mod constants;
pub mod endpoint;
pub mod error;
pub mod progress;
pub mod prober;
pub mod reporter;
pub mod session;
pub mod statistics;
pub mod transport;

pub use config::{Config, OutputFormat, PartialPolicy};
pub use constants::*;
pub use endpoint::Endpoint;
pub use error::{ClientError, ProberError, Result, StatsError};
pub use progress::ProgressTracker;
pub use prober::{run, Prober, ProberConfig};
pub use reporter::{Report, Reporter};
pub use session::{Sample, Session, SessionFailure};
pub use statistics::{summarize, Summary};
pub use transport::{TcpTransport, Transport, TransportError};
