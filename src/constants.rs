//! Project-wide constants used across multiple modules.
//!
//! This module centralizes constant definitions to avoid duplication and ensure
//! consistency across the codebase.

use std::time::Duration;

/// Spinner animation characters for progress indicators
pub const SPINNER_CHARS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Extensions accepted without a warning during input validation
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "aac", "ogg", "m4a", "wma", "opus"];

/// Upper bound of every phase's progress counter
pub const MAX_PROGRESS: u64 = 100;

/// Re-encode phases decode and encode the same media, so elapsed time counts double
pub const PROGRESS_REENCODE_MULTIPLIER: f64 = 2.0;
pub const PROGRESS_CONCAT_MULTIPLIER: f64 = 1.0;
pub const PROGRESS_FINAL_MULTIPLIER: f64 = 2.0;

/// Codec and extension of the intermediate files
pub const INTERMEDIATE_CODEC: &str = "flac";
pub const INTERMEDIATE_EXTENSION: &str = "flac";

/// Appended to an input's file name to form its intermediate file name
pub const INTERMEDIATE_SUFFIX: &str = "_converted";

pub const DEFAULT_FFMPEG: &str = "ffmpeg";
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;
pub const DEFAULT_CHANNELS: u16 = 2;

/// Interval between synthetic ticker increments
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(200);

/// The ticker never claims completion; only a successful exit does
pub const TICKER_CEILING: u64 = 99;

/// Diagnostic lines kept for the error report of a failed invocation
pub const DIAGNOSTIC_TAIL_LINES: usize = 8;
