use crate::client::constants::*;
use crate::client::error::{ClientError, Result};
use crate::client::session::Sample;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Live per-probe output while a session runs
pub struct ProgressTracker {
    pb: ProgressBar,
    quiet: bool,
    total_ms: f64,
    recorded: usize,
}

impl ProgressTracker {
    /// Create a tracker for `probe_count` probes; `quiet` suppresses all output
    pub fn new(probe_count: usize, quiet: bool) -> Result<Self> {
        let pb = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(probe_count as u64);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {bar:30.cyan/blue} {pos}/{len} probes {msg}",
                )
                .map_err(|e| ClientError::Progress(format!("Invalid progress template: {}", e)))?
                .progress_chars("█░"),
            );
            pb.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_INTERVAL_MS));
            pb
        };

        Ok(Self {
            pb,
            quiet,
            total_ms: 0.0,
            recorded: 0,
        })
    }

    /// Print the sample above the bar and refresh the running mean
    pub fn record(&mut self, sample: Sample) {
        let latency_ms = sample.as_millis();
        self.total_ms += latency_ms;
        self.recorded += 1;

        let line = format!("Latency: {}ms", colorize_latency(latency_ms));
        if self.pb.is_hidden() {
            // indicatif draws nothing without a terminal
            if !self.quiet {
                println!("{}", line);
            }
        } else {
            self.pb.println(line);
        }
        self.pb.inc(1);
        self.pb.set_message(format!(
            "(mean {:.2}ms)",
            self.total_ms / self.recorded as f64
        ));
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

fn colorize_latency(latency_ms: f64) -> ColoredString {
    let text = format!("{:.2}", latency_ms);
    if latency_ms < GOOD_LATENCY_MS {
        text.green()
    } else if latency_ms < ACCEPTABLE_LATENCY_MS {
        text.yellow()
    } else {
        text.red()
    }
}
