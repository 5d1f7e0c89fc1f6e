use crate::client::error::StatsError;
use crate::client::session::Sample;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Aggregate of a sequence of samples, all values in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

/// Reduce samples to mean/min/max in milliseconds.
///
/// Pure: the same input always yields the same summary, and input order
/// does not matter.
///
/// # Errors
///
/// Returns [`StatsError::EmptyInput`] for an empty slice; a session that
/// failed before its first echo has nothing to summarize.
pub fn summarize(samples: &[Sample]) -> Result<Summary, StatsError> {
    let first = samples.first().ok_or(StatsError::EmptyInput)?;

    let mut min = *first;
    let mut max = *first;
    let mut total_nanos: u128 = 0;

    for &sample in samples {
        min = min.min(sample);
        max = max.max(sample);
        total_nanos += sample.duration().as_nanos();
    }

    let summary = Summary {
        count: samples.len(),
        average: total_nanos as f64 / samples.len() as f64 / 1_000_000.0,
        min: min.as_millis(),
        max: max.as_millis(),
    };

    debug!(
        count = summary.count,
        average_ms = summary.average,
        min_ms = summary.min,
        max_ms = summary.max,
        "Samples summarized"
    );
    Ok(summary)
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Average: {:.2}ms", self.average)?;
        writeln!(f, "Min: {:.2}ms", self.min)?;
        write!(f, "Max: {:.2}ms", self.max)
    }
}
