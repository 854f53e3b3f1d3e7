//! Terminal progress indicators for the phases of a run.
//!
//! This module provides the standardized phase bar, the synthetic ticker used
//! when no real progress signal is wanted, and [`BarReporter`], which drives
//! both from the pipeline's [`ProgressReporter`] callbacks.

use crate::constants::{MAX_PROGRESS, SPINNER_CHARS, TICKER_CEILING};
use crate::progress::{ProgressReporter, ProgressSource};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Create a percentage bar for one phase with consistent styling.
///
/// # Arguments
///
/// * `label` - Description shown next to the bar, e.g. "Re-encoding file 1/3"
///
/// # Example
///
/// ```ignore
/// use crate::utils::progress::create_phase_bar;
///
/// let pb = create_phase_bar("Concatenating files");
/// pb.set_position(50);
/// pb.finish();
/// ```
pub fn create_phase_bar(label: &str) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(MAX_PROGRESS), ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} {msg:<24} [{bar:30.cyan/blue}] {pos:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_strings(SPINNER_CHARS)
            .progress_chars("█▓░"),
    );
    pb.set_message(label.to_string());
    pb
}

/// Advances a bar at a fixed interval on a helper thread.
///
/// The ticker stops at [`TICKER_CEILING`] so only a real completion shows
/// 100%. Stopping (or dropping) the ticker joins the thread.
pub struct Ticker {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn start(bar: ProgressBar, interval: Duration) -> Self {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if bar.position() < TICKER_CEILING {
                            bar.inc(1);
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Self {
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Renders each phase as its own indicatif bar on stderr.
pub struct BarReporter {
    bar: Option<ProgressBar>,
    ticker: Option<Ticker>,
    tick_interval: Duration,
    hidden: bool,
}

impl BarReporter {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            bar: None,
            ticker: None,
            tick_interval,
            hidden: false,
        }
    }

    /// A reporter that tracks state without drawing anything.
    pub fn hidden(tick_interval: Duration) -> Self {
        Self {
            hidden: true,
            ..Self::new(tick_interval)
        }
    }

    /// Position of the current (or last) phase bar.
    pub fn position(&self) -> Option<u64> {
        self.bar.as_ref().map(|bar| bar.position())
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
    }
}

impl ProgressReporter for BarReporter {
    fn begin(&mut self, label: &str, source: ProgressSource) {
        self.stop_ticker();

        let bar = create_phase_bar(label);
        if self.hidden {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        if source == ProgressSource::Ticker {
            self.ticker = Some(Ticker::start(bar.clone(), self.tick_interval));
        }
        self.bar = Some(bar);
    }

    fn advance(&mut self, percent: u64) {
        if self.ticker.is_some() {
            return;
        }
        if let Some(bar) = &self.bar {
            bar.set_position(percent);
        }
    }

    fn diagnostic(&mut self, line: &str) {
        match &self.bar {
            Some(bar) if !self.hidden => bar.println(format!("ffmpeg: {line}")),
            _ => {}
        }
    }

    fn complete(&mut self) {
        self.stop_ticker();
        if let Some(bar) = &self.bar {
            bar.set_position(MAX_PROGRESS);
            bar.finish();
        }
    }

    fn abandon(&mut self) {
        self.stop_ticker();
        if let Some(bar) = &self.bar {
            bar.abandon();
        }
    }
}
