//! Progress extraction from ffmpeg diagnostic output.
//!
//! ffmpeg reports elapsed media time either as a raw microsecond counter
//! (`out_time_ms=` in `-progress` output) or as a formatted `time=HH:MM:SS.ff`
//! field in its stats line. Neither carries a total duration, so each phase
//! scales elapsed seconds by a multiplier into a rough percentage.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::constants::MAX_PROGRESS;

static PROGRESS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"out_time_ms=(\d+)|time=(\d+):(\d+):(\d+\.\d+)").unwrap()
});

/// Extract a completion percentage from one diagnostic line.
///
/// Returns 0 when the line carries no timestamp. The result is clamped to
/// [0, 100].
pub fn parse_progress_line(line: &str, multiplier: f64) -> u64 {
    let Some(caps) = PROGRESS_LINE.captures(line) else {
        return 0;
    };

    // Fields are parsed as floats so arbitrarily long digit runs saturate
    // instead of overflowing.
    let seconds = if let Some(micros) = caps.get(1) {
        match micros.as_str().parse::<f64>() {
            Ok(micros) => micros / 1_000_000.0,
            Err(_) => return 0,
        }
    } else {
        let (Some(h), Some(m), Some(s)) = (caps.get(2), caps.get(3), caps.get(4)) else {
            return 0;
        };
        match (
            h.as_str().parse::<f64>(),
            m.as_str().parse::<f64>(),
            s.as_str().parse::<f64>(),
        ) {
            (Ok(h), Ok(m), Ok(s)) => h * 3600.0 + m * 60.0 + s,
            _ => return 0,
        }
    };

    percentage(seconds, multiplier)
}

fn percentage(seconds: f64, multiplier: f64) -> u64 {
    let scaled = seconds * multiplier;
    if scaled.is_nan() || scaled <= 0.0 {
        return 0;
    }
    scaled.min(MAX_PROGRESS as f64) as u64
}

/// Where a phase's progress indicator gets its values from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ProgressSource {
    /// Percentages parsed from the tool's diagnostic stream.
    #[default]
    Parsed,
    /// Fixed-interval synthetic increments; diagnostic timestamps are ignored.
    Ticker,
}

/// Per-phase progress counter that never moves backwards.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PhaseProgress {
    percent: u64,
}

impl PhaseProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn percent(&self) -> u64 {
        self.percent
    }

    /// Record a parsed value. Returns the new percentage when it advanced.
    pub fn observe(&mut self, percent: u64) -> Option<u64> {
        let percent = percent.min(MAX_PROGRESS);
        if percent > self.percent {
            self.percent = percent;
            Some(percent)
        } else {
            None
        }
    }

    pub fn complete(&mut self) {
        self.percent = MAX_PROGRESS;
    }
}

/// Receives progress for the phases of a run.
///
/// Every method has a no-op default so silent reporters stay trivial.
pub trait ProgressReporter {
    /// A new phase is starting; its counter starts at zero.
    fn begin(&mut self, _label: &str, _source: ProgressSource) {}

    /// The phase counter advanced to `percent`.
    fn advance(&mut self, _percent: u64) {}

    /// A raw diagnostic line, only delivered in verbose mode.
    fn diagnostic(&mut self, _line: &str) {}

    /// The phase finished successfully.
    fn complete(&mut self) {}

    /// The phase failed; the run is about to halt.
    fn abandon(&mut self) {}
}

/// Reporter that discards everything.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {}
