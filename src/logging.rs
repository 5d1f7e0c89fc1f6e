use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log levels accepted on the command line
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Initialize structured logging at `info` level.
///
/// Log level can be controlled via the `RUST_LOG` environment variable.
/// Examples:
/// - `RUST_LOG=debug` - Debug level and above
/// - `RUST_LOG=lagline=debug` - Debug level for lagline crate only
pub fn init_logging() {
    init_logging_with_config("info", false);
}

/// Initialize structured logging from CLI options.
///
/// `RUST_LOG` takes precedence over `level` when it is set and valid.
pub fn init_logging_with_config(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_lowercase()));

    let registry = tracing_subscriber::registry().with(filter);

    // try_init: a second initialization (tests, embedding) is not an error
    let result = if json {
        registry
            .with(fmt::layer().json().with_target(false).with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}

/// Validates a log level string against [`LOG_LEVELS`]
pub fn validate_log_level(level: &str) -> Result<(), String> {
    if LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(format!("log_level must be one of: {}", LOG_LEVELS.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_log_level() {
        assert!(validate_log_level("info").is_ok());
        assert!(validate_log_level("WARN").is_ok());
        assert!(validate_log_level("verbose").is_err());
    }

    #[test]
    fn test_repeated_init_does_not_panic() {
        init_logging();
        init_logging_with_config("debug", true);
    }
}
