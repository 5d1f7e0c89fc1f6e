use anyhow::Result;
use clap::Parser;
use lagline::logging::init_logging_with_config;
use lagline::server::{
    listen, Responder, ResponderError, ServerConfig, ServerMonitor, ALL_INTERFACES,
};
use tracing::{error, info};

fn main() {
    let config = ServerConfig::parse();

    init_logging_with_config(&config.log_level, config.is_json_format());

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config) {
        error!(error = %e, "Server failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(config: ServerConfig) -> Result<()> {
    let addr = config.address();
    let monitor = ServerMonitor::new(config.update_interval);

    let bound = if config.bind == ALL_INTERFACES {
        listen(config.port, monitor.counters())
    } else {
        Responder::bind(&addr, monitor.counters())
    };
    let responder = bound.map_err(|e| match e {
        ResponderError::Bind { ref source, .. }
            if source.kind() == std::io::ErrorKind::AddrInUse =>
        {
            anyhow::anyhow!(
                "Failed to bind to {}: Address already in use. Try a different port or ensure no other process is using it.",
                addr
            )
        }
        other => anyhow::Error::new(other),
    })?;

    info!(
        address = %addr,
        update_interval_ms = config.update_interval,
        quiet_mode = config.quiet,
        "Lagline responder listening"
    );

    if !config.quiet {
        monitor.start_display();
    } else {
        info!("Running in quiet mode (terminal UI disabled)");
    }

    // SIGINT/SIGTERM terminate the process; the OS closes every socket
    responder.serve()?;

    let stats = monitor.stats();
    info!(
        connections = stats.connections_total,
        probes = stats.probes_received,
        echoes = stats.echoes_sent,
        malformed = stats.malformed_frames,
        uptime_s = stats.elapsed.as_secs(),
        "Responder exited"
    );
    Ok(())
}
