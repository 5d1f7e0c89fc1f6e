use crate::client::config::PartialPolicy;
use crate::client::error::Result;
use crate::client::session::{Session, SessionFailure};
use crate::client::statistics::{summarize, Summary};
use colored::*;
use serde::Serialize;
use tracing::{info, warn};

/// Final outcome of a prober run, ready to render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Probes the session was meant to send
    pub target: usize,
    /// Probes that got an echo
    pub completed: usize,
    pub summary: Option<Summary>,
    pub error: Option<String>,
    /// 1-based number of the probe that failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_probe: Option<usize>,
}

impl Report {
    /// Build a report, applying `policy` to the samples of a failed session
    pub fn from_outcome(
        outcome: &std::result::Result<Session, SessionFailure>,
        policy: PartialPolicy,
    ) -> Self {
        match outcome {
            Ok(session) => Self {
                target: session.target(),
                completed: session.len(),
                summary: summarize(session.samples()).ok(),
                error: None,
                failed_probe: None,
            },
            Err(failure) => {
                let summary = match policy {
                    PartialPolicy::Report => summarize(failure.session.samples()).ok(),
                    PartialPolicy::Discard => None,
                };
                Self {
                    target: failure.session.target(),
                    completed: failure.session.len(),
                    summary,
                    error: Some(failure.error.to_string()),
                    failed_probe: failure.error.probe(),
                }
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Reporter for printing probe session results
pub struct Reporter;

impl Reporter {
    /// Human-readable rendering of a report
    pub fn render_text(report: &Report) -> String {
        let mut lines = Vec::new();

        match &report.error {
            None => {
                lines.push(format!("\n{}", "Latency Statistics:".bold()));
            }
            Some(error) => {
                lines.push(format!(
                    "\n{}",
                    format!(
                        "✗ Probe session failed after {}/{} probes",
                        report.completed, report.target
                    )
                    .red()
                    .bold()
                ));
                lines.push(format!("  └─ {}", error));
                if report.summary.is_some() {
                    lines.push(format!(
                        "\n{}",
                        format!(
                            "Partial Latency Statistics ({} of {} probes):",
                            report.completed, report.target
                        )
                        .yellow()
                        .bold()
                    ));
                }
            }
        }

        if let Some(summary) = &report.summary {
            lines.push(summary.to_string());
        }

        lines.join("\n")
    }

    pub fn render_json(report: &Report) -> Result<String> {
        Ok(serde_json::to_string(report)?)
    }

    pub fn print_text(&self, report: &Report) {
        self.log_outcome(report);
        println!("{}", Self::render_text(report));
    }

    pub fn print_json(&self, report: &Report) -> Result<()> {
        self.log_outcome(report);
        println!("{}", Self::render_json(report)?);
        Ok(())
    }

    fn log_outcome(&self, report: &Report) {
        match (&report.error, &report.summary) {
            (None, Some(summary)) => info!(
                probes = report.completed,
                average_ms = summary.average,
                min_ms = summary.min,
                max_ms = summary.max,
                "Results reported"
            ),
            (error, _) => warn!(
                completed = report.completed,
                target = report.target,
                failed_probe = ?report.failed_probe,
                error = ?error,
                "Session did not complete"
            ),
        }
    }
}
