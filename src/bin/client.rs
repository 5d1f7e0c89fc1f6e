use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use lagline::client::{self, Config, Endpoint, OutputFormat, ProgressTracker, Report, Reporter};
use lagline::logging::init_logging_with_config;
use tracing::error;

fn main() {
    let config = Config::parse();

    init_logging_with_config(&config.log_level, config.is_json_format());

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        eprintln!("{}", e);
        std::process::exit(1);
    }

    match run(config) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!(error = %e, "Client failed");
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the full session completed
fn run(config: Config) -> Result<bool> {
    let endpoint = Endpoint::parse(&config.server).context("Invalid --server address")?;
    let text_output = config.output == OutputFormat::Text;

    if text_output && !config.quiet {
        println!("{}", "Lagline Latency Probe".bold());
        println!("Server: {}  Probes: {}\n", endpoint, config.count);
    }

    let mut progress = ProgressTracker::new(config.count, config.quiet || !text_output)?;
    let outcome = client::run(
        &endpoint,
        &config.prober_config(),
        config.connect_timeout(),
        |_, sample| progress.record(sample),
    );
    progress.finish();

    let report = Report::from_outcome(&outcome, config.partial);
    let reporter = Reporter;
    match config.output {
        OutputFormat::Text => reporter.print_text(&report),
        OutputFormat::Json => reporter.print_json(&report)?,
    }

    Ok(report.is_success())
}
