//! aconcat - concatenate audio files of mixed formats into one file.
//!
//! Every input is first re-encoded to a common FLAC intermediate (same sample
//! rate and channel layout), the intermediates are joined with ffmpeg's concat
//! demuxer, and the result is re-encoded once more if the requested output is
//! not FLAC. All media work is done by an external `ffmpeg`; this binary
//! validates, sequences, and reports progress.

use aconcat::progress::ProgressSource;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, Shell, generate};
use owo_colors::OwoColorize;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

use cli::concat::ConcatRequest;

const EXAMPLES: &str = "Examples:
  ac -output final_audio.wav file1.mp3 file2.wav
  ac -sample-rate 44100 -output final.flac file1.aac file2.ogg";

#[derive(Parser)]
#[command(name = "ac")]
#[command(about = "Concatenate multiple audio files into one output file")]
#[command(
    long_about = "Concatenate multiple audio files into one output file.\n\n\
    Inputs are re-encoded to a common format (FLAC) before concatenation; \
    the output extension decides the final format."
)]
#[command(version, after_help = EXAMPLES)]
struct Cli {
    /// Enable verbose logging and echo ffmpeg output
    #[arg(short, long)]
    verbose: bool,
    /// Output audio file (required)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Sample rate for re-encoding [default: 48000]
    #[arg(short = 'r', long, value_name = "HZ")]
    sample_rate: Option<u32>,
    /// Channel count for re-encoding [default: 2]
    #[arg(long, value_name = "N")]
    channels: Option<u16>,
    /// ffmpeg executable to use
    #[arg(long, value_name = "PATH")]
    ffmpeg: Option<PathBuf>,
    /// Where progress bars get their values from
    #[arg(long, value_enum)]
    progress: Option<ProgressSource>,
    /// Replace the output file if it already exists
    #[arg(short = 'y', long)]
    overwrite: bool,
    /// Also write a debug log to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
    /// Write a default settings file and exit
    #[arg(long)]
    init_config: bool,
    /// Generate shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
    /// Input audio files, in the order they should be joined
    #[arg(value_name = "INPUT")]
    inputs: Vec<PathBuf>,
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn usage_error(message: &str) -> ExitCode {
    eprintln!("{} {message}", "Error:".red().bold());
    eprintln!();
    eprintln!("{}", Cli::command().render_help());
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let args = cli::args::normalize_long_flags(std::env::args_os());
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and succeed; anything else is a usage error
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        print_completions(shell, &mut cmd);
        return ExitCode::SUCCESS;
    }

    if let Err(e) = cli::logging::init_logging(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("{} failed to initialize logging: {e}", "Error:".red().bold());
        return ExitCode::FAILURE;
    }

    if cli.init_config {
        return match cli::init::handle_init_config() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{} {e}", "Error:".red().bold());
                ExitCode::FAILURE
            }
        };
    }

    let output = match cli.output {
        Some(output) if cli.inputs.len() >= 2 => output,
        _ => {
            return usage_error(
                "You must provide at least two input files and specify an output file.",
            );
        }
    };

    let request = ConcatRequest {
        inputs: cli.inputs,
        output,
        verbose: cli.verbose,
        overwrite: cli.overwrite,
        sample_rate: cli.sample_rate,
        channels: cli.channels,
        ffmpeg: cli.ffmpeg,
        progress: cli.progress,
    };

    match cli::concat::handle_concat(request) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("run failed: {e:?}");
            eprintln!("{} {e}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
