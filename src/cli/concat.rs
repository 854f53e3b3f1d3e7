use aconcat::config::{ConcatConfig, ConcatConfigBuilder, Settings};
use aconcat::pipeline::{self, Pipeline};
use aconcat::progress::ProgressSource;
use aconcat::utils::files::format_megabytes;
use aconcat::utils::progress::BarReporter;
use dialoguer::{Confirm, theme::ColorfulTheme};
use owo_colors::OwoColorize;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Command-line values for one run. Unset options fall back to the settings
/// file.
pub struct ConcatRequest {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub verbose: bool,
    pub overwrite: bool,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub ffmpeg: Option<PathBuf>,
    pub progress: Option<ProgressSource>,
}

pub fn handle_concat(request: ConcatRequest) -> Result<(), Box<dyn Error>> {
    let settings = Settings::load()?;

    let mut builder = ConcatConfig::builder(request.inputs, &request.output)
        .settings(&settings)
        .verbose(request.verbose);
    if let Some(sample_rate) = request.sample_rate {
        builder = builder.sample_rate(sample_rate);
    }
    if let Some(channels) = request.channels {
        builder = builder.channels(channels);
    }
    if let Some(ffmpeg) = request.ffmpeg {
        builder = builder.ffmpeg(ffmpeg);
    }
    if let Some(progress) = request.progress {
        builder = builder.progress(progress);
    }

    let overwrite = request.overwrite
        || resolve_overwrite(
            &builder,
            &request.output,
            console::user_attended(),
            prompt_overwrite,
        )?;
    let config = builder.overwrite(overwrite).build()?;

    let mut reporter = BarReporter::new(config.tick_interval());
    let summary = pipeline::run(&config, &mut reporter)?;

    println!(
        "{} Concatenated {} files into {} ({})",
        "✓".green().bold(),
        summary.inputs,
        summary.output.display().cyan(),
        format_megabytes(summary.output_size)
    );

    Ok(())
}

/// Decide whether an existing output may be replaced.
///
/// Only an attended run is asked, and only after the inputs checked out, so a
/// typo in an input path fails without a prompt. Unattended runs leave the
/// decision to the pipeline, which refuses to overwrite.
fn resolve_overwrite<F>(
    builder: &ConcatConfigBuilder,
    output: &Path,
    attended: bool,
    ask: F,
) -> Result<bool, Box<dyn Error>>
where
    F: FnOnce(&Path) -> Result<bool, Box<dyn Error>>,
{
    if !output.exists() || !attended {
        return Ok(false);
    }

    let candidate = builder.clone().overwrite(true).build()?;
    Pipeline::new(&candidate).validate()?;

    if !ask(output)? {
        return Err("Aborted: output file left untouched".into());
    }
    Ok(true)
}

fn prompt_overwrite(output: &Path) -> Result<bool, Box<dyn Error>> {
    let replace = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "Output file '{}' already exists. Overwrite?",
            output.display().yellow()
        ))
        .default(false)
        .interact()?;
    Ok(replace)
}
