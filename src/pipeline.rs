//! The concatenation pipeline.
//!
//! A run moves through fixed phases and never goes back:
//!
//! 1. **Validate** every input (and the output path) before anything runs.
//! 2. **Re-encode** each input, in order, to a FLAC intermediate with a
//!    common sample rate and channel layout.
//! 3. **Build manifest** listing the intermediates for the concat demuxer.
//! 4. **Concatenate** the intermediates with a stream copy.
//! 5. **Final encode**, only when the requested output is not FLAC.
//!
//! Intermediates live in a temporary directory owned by the run and the
//! manifest is a temporary file; both are removed on every exit path. The
//! final product is also written inside the temporary directory and only
//! moved onto the output path once every phase has succeeded, so a failed
//! run never touches an existing output.

use crate::config::ConcatConfig;
use crate::constants::{INTERMEDIATE_EXTENSION, INTERMEDIATE_SUFFIX};
use crate::error::{ConcatError, Result};
use crate::ffmpeg::Ffmpeg;
use crate::manifest::Manifest;
use crate::progress::ProgressReporter;
use crate::runner::{RunOptions, run_tool};
use crate::utils::files::{format_megabytes, log_file_size};
use crate::utils::validation::{ValidatedInput, validate_input_file};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validate,
    ReEncode { index: usize, total: usize },
    BuildManifest,
    Concatenate,
    FinalEncode,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Validate => write!(f, "Validating input files"),
            Phase::ReEncode { index, total } => {
                write!(f, "Re-encoding file {}/{}", index + 1, total)
            }
            Phase::BuildManifest => write!(f, "Building concatenation list"),
            Phase::Concatenate => write!(f, "Concatenating files"),
            Phase::FinalEncode => write!(f, "Final encoding"),
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatSummary {
    pub output: PathBuf,
    pub output_size: u64,
    pub inputs: usize,
    /// Whether the combined FLAC was re-encoded into another format
    pub final_encode: bool,
}

/// Run the whole pipeline for `config`.
pub fn run(config: &ConcatConfig, reporter: &mut dyn ProgressReporter) -> Result<ConcatSummary> {
    Pipeline::new(config).run(reporter)
}

/// Whether `output` needs a final encode out of the intermediate codec.
pub fn needs_final_encode(output: &Path) -> bool {
    !output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(INTERMEDIATE_EXTENSION))
}

pub struct Pipeline<'a> {
    config: &'a ConcatConfig,
    ffmpeg: Ffmpeg,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a ConcatConfig) -> Self {
        Self {
            config,
            ffmpeg: Ffmpeg::new(config.ffmpeg()),
        }
    }

    pub fn run(&self, reporter: &mut dyn ProgressReporter) -> Result<ConcatSummary> {
        let inputs = self.validate()?;

        let work_dir = tempfile::Builder::new()
            .prefix("audio_concat")
            .tempdir()
            .map_err(|e| ConcatError::TempResource {
                what: "directory",
                source: e,
            })?;
        log::info!(
            "Temporary directory for re-encoded files: {}",
            work_dir.path().display()
        );
        log::debug!("Using ffmpeg at {}", self.ffmpeg.program().display());

        let result = self.process(&inputs, &work_dir, reporter);

        if let Err(e) = work_dir.close() {
            log::warn!("Failed to remove temporary directory: {e}");
        }
        result
    }

    /// Check every input and the output path. Nothing external runs before
    /// this succeeds.
    pub fn validate(&self) -> Result<Vec<ValidatedInput>> {
        log::info!("{}...", Phase::Validate);

        let mut validated = Vec::with_capacity(self.config.inputs().len());
        for input in self.config.inputs() {
            let checked = validate_input_file(input)?;
            log::info!("OK: {}", input.display());
            validated.push(checked);
        }

        let output = std::path::absolute(self.config.output())?;
        if validated.iter().any(|input| same_file(&input.path, &output)) {
            return Err(ConcatError::OutputIsInput(output));
        }
        if output.exists() && !self.config.overwrite() {
            return Err(ConcatError::OutputExists(output));
        }
        if let Some(parent) = output.parent().filter(|parent| !parent.is_dir()) {
            return Err(ConcatError::NotFound(parent.to_path_buf()));
        }

        log::info!("Files to be processed:");
        for (i, input) in validated.iter().enumerate() {
            log::info!(
                "  {}. {} ({}){}",
                i + 1,
                input.path.display(),
                format_megabytes(input.size),
                if input.recognized {
                    ""
                } else {
                    " [unrecognized extension]"
                }
            );
        }

        Ok(validated)
    }

    fn process(
        &self,
        inputs: &[ValidatedInput],
        work_dir: &TempDir,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<ConcatSummary> {
        let intermediates = self.reencode_all(inputs, work_dir.path(), reporter)?;

        log::info!("{}...", Phase::BuildManifest);
        let manifest = Manifest::write(&intermediates)?;
        log::info!(
            "Temporary concatenation list file: {}",
            manifest.path().display()
        );
        log::info!("Temporary file content:\n{}", manifest.read_back()?);

        let output = self.config.output();
        let final_encode = needs_final_encode(output);
        let staged = staging_path(work_dir.path(), output)?;
        let combined = if final_encode {
            work_dir
                .path()
                .join(format!("combined.{INTERMEDIATE_EXTENSION}"))
        } else {
            staged.clone()
        };

        log::info!("Running ffmpeg to concatenate files.");
        let concat = self.ffmpeg.concat(
            manifest.path(),
            &combined,
            Phase::Concatenate.to_string(),
        );
        run_tool(&concat, self.options(), reporter)?;
        drop(manifest);

        log::info!(
            "Concatenation of audio files is successful! Combined file: {}",
            combined.display()
        );
        log_file_size(&combined, "Combined");

        if final_encode {
            log::info!("Re-encoding {} to {}", combined.display(), staged.display());
            let encode =
                self.ffmpeg
                    .final_encode(&combined, &staged, Phase::FinalEncode.to_string());
            run_tool(&encode, self.options(), reporter)?;
            log::info!("Re-encoding to {} successful!", staged.display());

            if let Err(e) = fs::remove_file(&combined) {
                log::warn!("Failed to remove {}: {e}", combined.display());
            }
        }

        publish(&staged, output)?;
        log::info!("Output file: {}", output.display());
        log_file_size(output, "Final output");

        let output_size = fs::metadata(output)?.len();
        Ok(ConcatSummary {
            output: output.to_path_buf(),
            output_size,
            inputs: inputs.len(),
            final_encode,
        })
    }

    fn reencode_all(
        &self,
        inputs: &[ValidatedInput],
        work_dir: &Path,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<Vec<PathBuf>> {
        let total = inputs.len();
        let mut taken = HashSet::new();
        let mut converted = Vec::with_capacity(total);

        for (index, input) in inputs.iter().enumerate() {
            let target = work_dir.join(intermediate_name(&input.path, &mut taken));
            log::info!(
                "Re-encoding {} to {}",
                input.path.display(),
                target.display()
            );

            let invocation = self.ffmpeg.reencode(
                &input.path,
                &target,
                self.config.sample_rate(),
                self.config.channels(),
                Phase::ReEncode { index, total }.to_string(),
            );
            run_tool(&invocation, self.options(), reporter)?;
            converted.push(target);
        }

        Ok(converted)
    }

    fn options(&self) -> RunOptions {
        RunOptions {
            verbose: self.config.verbose(),
            source: self.config.progress(),
        }
    }
}

/// `<file name>_converted.flac`, with a numeric disambiguator when another
/// input already claimed the name.
fn intermediate_name(input: &Path, taken: &mut HashSet<OsString>) -> OsString {
    let base = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string());

    let mut candidate = OsString::from(format!(
        "{base}{INTERMEDIATE_SUFFIX}.{INTERMEDIATE_EXTENSION}"
    ));
    let mut n = 2;
    while taken.contains(&candidate) {
        candidate = OsString::from(format!(
            "{base}{INTERMEDIATE_SUFFIX}_{n}.{INTERMEDIATE_EXTENSION}"
        ));
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

/// Where the last phase writes its product: a dedicated directory inside the
/// work dir, under the output's own file name so ffmpeg still picks the
/// container from its extension.
fn staging_path(work_dir: &Path, output: &Path) -> Result<PathBuf> {
    let name = output.file_name().ok_or_else(|| {
        ConcatError::Config(format!("output path has no file name: {}", output.display()))
    })?;
    let dir = work_dir.join("result");
    fs::create_dir(&dir)?;
    Ok(dir.join(name))
}

/// Move the finished product onto `output`.
///
/// A rename replaces the output in one step. When that is not possible (the
/// temporary directory is on another filesystem) the content is copied to a
/// sibling of the output first and then renamed over it.
fn publish(staged: &Path, output: &Path) -> Result<()> {
    match fs::rename(staged, output) {
        Ok(()) => return Ok(()),
        Err(e) => log::debug!("Rename into place failed ({e}), copying instead"),
    }

    let publish_err = |source: io::Error| ConcatError::Publish {
        path: output.to_path_buf(),
        source,
    };
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut copy = tempfile::Builder::new()
        .prefix(".aconcat-")
        .tempfile_in(dir)
        .map_err(publish_err)?;
    let mut source = fs::File::open(staged).map_err(publish_err)?;
    io::copy(&mut source, copy.as_file_mut()).map_err(publish_err)?;
    if let Ok(metadata) = fs::metadata(staged) {
        let _ = fs::set_permissions(copy.path(), metadata.permissions());
    }
    copy.persist(output).map_err(|e| publish_err(e.error))?;
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
