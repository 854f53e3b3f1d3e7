//! The fixed ffmpeg command grammar for each pipeline phase.
//!
//! Every invocation runs non-interactively (`-nostdin -y`) and asks for
//! machine-readable progress on stderr (`-progress pipe:2`), which is the
//! stream the runner parses.

use crate::constants::{
    INTERMEDIATE_CODEC, PROGRESS_CONCAT_MULTIPLIER, PROGRESS_FINAL_MULTIPLIER,
    PROGRESS_REENCODE_MULTIPLIER,
};
use crate::runner::ToolInvocation;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

const COMMON_ARGS: &[&str] = &["-hide_banner", "-nostdin", "-y"];
const PROGRESS_ARGS: &[&str] = &["-progress", "pipe:2"];

/// Builds invocations of one ffmpeg executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ffmpeg {
    program: PathBuf,
}

impl Ffmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Transcode one input to the intermediate codec.
    pub fn reencode(
        &self,
        input: &Path,
        output: &Path,
        sample_rate: u32,
        channels: u16,
        label: impl Into<String>,
    ) -> ToolInvocation {
        let mut args = common_args();
        args.push("-i".into());
        args.push(input.into());
        args.push("-ar".into());
        args.push(sample_rate.to_string().into());
        args.push("-ac".into());
        args.push(channels.to_string().into());
        args.push("-c:a".into());
        args.push(INTERMEDIATE_CODEC.into());
        self.finish(args, output, label, PROGRESS_REENCODE_MULTIPLIER)
    }

    /// Stream-copy every file listed in `manifest` into `output`.
    pub fn concat(
        &self,
        manifest: &Path,
        output: &Path,
        label: impl Into<String>,
    ) -> ToolInvocation {
        let mut args = common_args();
        for arg in ["-f", "concat", "-safe", "0", "-i"] {
            args.push(arg.into());
        }
        args.push(manifest.into());
        args.push("-c".into());
        args.push("copy".into());
        self.finish(args, output, label, PROGRESS_CONCAT_MULTIPLIER)
    }

    /// Re-encode the combined intermediate into the format implied by `output`.
    pub fn final_encode(
        &self,
        input: &Path,
        output: &Path,
        label: impl Into<String>,
    ) -> ToolInvocation {
        let mut args = common_args();
        args.push("-i".into());
        args.push(input.into());
        self.finish(args, output, label, PROGRESS_FINAL_MULTIPLIER)
    }

    fn finish(
        &self,
        mut args: Vec<OsString>,
        output: &Path,
        label: impl Into<String>,
        multiplier: f64,
    ) -> ToolInvocation {
        args.extend(PROGRESS_ARGS.iter().map(OsString::from));
        args.push(output.into());
        ToolInvocation {
            program: self.program.clone(),
            args,
            label: label.into(),
            multiplier,
        }
    }
}

fn common_args() -> Vec<OsString> {
    COMMON_ARGS.iter().map(OsString::from).collect()
}
