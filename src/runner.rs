//! Supervision of a single external tool invocation.

use crate::constants::DIAGNOSTIC_TAIL_LINES;
use crate::error::{ConcatError, Result};
use crate::progress::{PhaseProgress, ProgressReporter, ProgressSource, parse_progress_line};
use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// A fully specified external command plus how to report its progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Shown on the progress indicator and in error messages
    pub label: String,
    /// Scale applied to elapsed seconds when computing a percentage
    pub multiplier: f64,
}

impl ToolInvocation {
    /// Render the command line for logs.
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// How the runner reports what it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub verbose: bool,
    pub source: ProgressSource,
}

/// Run `invocation` to completion, streaming its stderr into `reporter`.
///
/// Stdin and stdout are detached; stderr is read line by line until the
/// stream closes, and only then is the exit status collected. A non-zero exit
/// becomes [`ConcatError::ExternalToolFailure`] carrying the last few
/// diagnostic lines.
pub fn run_tool(
    invocation: &ToolInvocation,
    options: RunOptions,
    reporter: &mut dyn ProgressReporter,
) -> Result<()> {
    log::debug!("Running: {}", invocation.command_line());
    reporter.begin(&invocation.label, options.source);

    let result = supervise(invocation, options, reporter);
    match &result {
        Ok(()) => reporter.complete(),
        Err(_) => reporter.abandon(),
    }
    result
}

fn supervise(
    invocation: &ToolInvocation,
    options: RunOptions,
    reporter: &mut dyn ProgressReporter,
) -> Result<()> {
    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ConcatError::ToolStart {
            program: invocation.program.display().to_string(),
            source: e,
        })?;

    let mut tail = VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES);
    let mut progress = PhaseProgress::new();

    if let Some(stderr) = child.stderr.take() {
        let read = for_each_line(stderr, |line| {
            if options.verbose {
                reporter.diagnostic(line);
            }
            if options.source == ProgressSource::Parsed {
                let percent = parse_progress_line(line, invocation.multiplier);
                if let Some(percent) = progress.observe(percent) {
                    reporter.advance(percent);
                }
            }
            if tail.len() == DIAGNOSTIC_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line.to_string());
        });

        if let Err(e) = read {
            // Reap the child before bailing so it does not linger as a zombie
            let _ = child.kill();
            let _ = child.wait();
            return Err(e.into());
        }
    }

    let status = child.wait()?;
    if !status.success() {
        return Err(ConcatError::ExternalToolFailure {
            label: invocation.label.clone(),
            status,
            detail: failure_detail(&tail),
        });
    }

    progress.complete();
    reporter.advance(progress.percent());
    Ok(())
}

/// Feed every non-empty line of `stream` to `f`.
///
/// ffmpeg rewrites its stats line in place with carriage returns, so both
/// `\r` and `\n` terminate a line.
fn for_each_line<R: Read>(stream: R, mut f: impl FnMut(&str)) -> std::io::Result<()> {
    let reader = BufReader::new(stream);
    for chunk in reader.split(b'\n') {
        let chunk = chunk?;
        for piece in chunk.split(|b| *b == b'\r') {
            let line = String::from_utf8_lossy(piece);
            let line = line.trim_end();
            if !line.is_empty() {
                f(line);
            }
        }
    }
    Ok(())
}

/// Keep the lines most likely to explain a failure, skipping `-progress`
/// key=value noise.
fn failure_detail(tail: &VecDeque<String>) -> String {
    tail.iter()
        .filter(|line| !is_progress_key_value(line))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("; ")
}

fn is_progress_key_value(line: &str) -> bool {
    match line.split_once('=') {
        Some((key, _)) => {
            !key.is_empty() && key.bytes().all(|b| b.is_ascii_lowercase() || b == b'_')
        }
        None => false,
    }
}
