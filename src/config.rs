//! Configuration for a concatenation run.
//!
//! Two layers feed a run. [`Settings`] are persistent user defaults read from
//! the config directory (typically ~/.config/aconcat/config.toml); every field
//! is optional in the file. [`ConcatConfig`] is the immutable, fully resolved
//! configuration the pipeline consumes, built from command-line values layered
//! over those settings.

use crate::constants::{
    DEFAULT_CHANNELS, DEFAULT_FFMPEG, DEFAULT_SAMPLE_RATE, DEFAULT_TICK_INTERVAL,
};
use crate::error::{ConcatError, Result};
use crate::progress::ProgressSource;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// ffmpeg executable; a leading `~` is expanded
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_channels")]
    pub channels: u16,
    #[serde(default)]
    pub progress: ProgressSource,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_ffmpeg() -> String {
    DEFAULT_FFMPEG.to_string()
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_channels() -> u16 {
    DEFAULT_CHANNELS
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL.as_millis() as u64
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    pub fn new() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            progress: ProgressSource::default(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }

    pub fn config_dir() -> Result<PathBuf> {
        // Check for XDG_CONFIG_HOME first (useful for testing)
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join("aconcat")
        } else {
            dirs::config_dir()
                .ok_or_else(|| ConcatError::Config("unable to find config directory".into()))?
                .join("aconcat")
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load settings, falling back to defaults when no file exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Default::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| ConcatError::Config(format!("{}: {e}", path.display())))
    }

    pub fn save(&self) -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string =
            toml::to_string_pretty(self).map_err(|e| ConcatError::Config(e.to_string()))?;
        fs::write(&config_path, toml_string)?;

        Ok(config_path)
    }

    pub fn exists() -> Result<bool> {
        Ok(Self::config_path()?.exists())
    }

    /// The ffmpeg program with `~` and environment variables expanded.
    pub fn ffmpeg_program(&self) -> PathBuf {
        match shellexpand::full(&self.ffmpeg) {
            Ok(expanded) => PathBuf::from(expanded.into_owned()),
            Err(_) => PathBuf::from(shellexpand::tilde(&self.ffmpeg).into_owned()),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Immutable configuration of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatConfig {
    inputs: Vec<PathBuf>,
    output: PathBuf,
    sample_rate: u32,
    channels: u16,
    verbose: bool,
    overwrite: bool,
    ffmpeg: PathBuf,
    progress: ProgressSource,
    tick_interval: Duration,
}

impl ConcatConfig {
    /// Start a builder seeded with defaults.
    pub fn builder<I, P, Q>(inputs: I, output: Q) -> ConcatConfigBuilder
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
    {
        ConcatConfigBuilder {
            inputs: inputs.into_iter().map(Into::into).collect(),
            output: output.into(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            verbose: false,
            overwrite: false,
            ffmpeg: PathBuf::from(DEFAULT_FFMPEG),
            progress: ProgressSource::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    pub fn progress(&self) -> ProgressSource {
        self.progress
    }

    /// Interval between synthetic increments in ticker mode.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }
}

/// Builder for [`ConcatConfig`].
#[derive(Debug, Clone)]
pub struct ConcatConfigBuilder {
    inputs: Vec<PathBuf>,
    output: PathBuf,
    sample_rate: u32,
    channels: u16,
    verbose: bool,
    overwrite: bool,
    ffmpeg: PathBuf,
    progress: ProgressSource,
    tick_interval: Duration,
}

impl ConcatConfigBuilder {
    /// Take every default the settings file provides.
    pub fn settings(mut self, settings: &Settings) -> Self {
        self.sample_rate = settings.sample_rate;
        self.channels = settings.channels;
        self.ffmpeg = settings.ffmpeg_program();
        self.progress = settings.progress;
        self.tick_interval = settings.tick_interval();
        self
    }

    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn ffmpeg(mut self, program: impl Into<PathBuf>) -> Self {
        self.ffmpeg = program.into();
        self
    }

    pub fn progress(mut self, progress: ProgressSource) -> Self {
        self.progress = progress;
        self
    }

    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn build(self) -> Result<ConcatConfig> {
        if self.inputs.len() < 2 {
            return Err(ConcatError::NotEnoughInputs(self.inputs.len()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(ConcatError::Config("output path is empty".into()));
        }
        if self.sample_rate == 0 {
            return Err(ConcatError::Config("sample rate must be positive".into()));
        }
        if self.channels == 0 {
            return Err(ConcatError::Config("channel count must be positive".into()));
        }
        if self.tick_interval.is_zero() {
            return Err(ConcatError::Config("tick interval must be positive".into()));
        }

        Ok(ConcatConfig {
            inputs: self.inputs,
            output: self.output,
            sample_rate: self.sample_rate,
            channels: self.channels,
            verbose: self.verbose,
            overwrite: self.overwrite,
            ffmpeg: self.ffmpeg,
            progress: self.progress,
            tick_interval: self.tick_interval,
        })
    }
}
