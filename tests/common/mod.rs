#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Write a short mono 16-bit sine tone.
///
/// The fixtures are synthesized at test time so no binary assets live in the
/// repository. The fake ffmpeg never decodes them, but they are real WAVs.
pub fn write_test_tone(path: &Path, sample_rate: u32, duration_ms: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let total = sample_rate as u64 * duration_ms as u64 / 1000;
    for n in 0..total {
        let theta = (n as f32 / sample_rate as f32) * 2.0 * std::f32::consts::PI * 440.0;
        writer
            .write_sample((theta.sin() * i16::MAX as f32 * 0.5) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
}

/// A stand-in ffmpeg: a shell script that records each invocation, prints
/// progress on stderr like the real tool, and writes its last argument as
/// the output file.
pub struct FakeFfmpeg {
    pub program: PathBuf,
    pub log: PathBuf,
}

impl FakeFfmpeg {
    pub fn install(dir: &Path) -> Self {
        Self::install_failing(dir, None)
    }

    /// Like [`FakeFfmpeg::install`], but any invocation whose arguments
    /// contain `fail_on` writes a partial output and exits with status 1.
    pub fn install_failing(dir: &Path, fail_on: Option<&str>) -> Self {
        let program = dir.join("ffmpeg");
        let log = dir.join("invocations.log");

        let failure = match fail_on {
            Some(pattern) => format!(
                "case \"$*\" in *'{pattern}'*) printf 'partial' > \"$out\"; \
                 echo \"{pattern}: simulated failure\" >&2; exit 1;; esac"
            ),
            None => String::new(),
        };

        let script = format!(
            r#"#!/bin/sh
log='{log}'
printf 'RUN %s\n' "$*" >> "$log"
prev=""
input=""
out=""
for arg in "$@"; do
  if [ "$prev" = "-i" ]; then input="$arg"; fi
  prev="$arg"
  out="$arg"
done
case "$*" in
  *"-f concat"*) cat "$input" >> "$log" ;;
esac
{failure}
printf 'size=       1kB time=00:00:01.50 bitrate= 1.0kbits/s speed=10x\r' >&2
printf 'out_time_ms=3000000\nprogress=end\n' >&2
printf 'fake audio\n' > "$out"
"#,
            log = log.display(),
        );
        fs::write(&program, script).unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();
        }

        Self { program, log }
    }

    fn log_lines(&self) -> Vec<String> {
        match fs::read_to_string(&self.log) {
            Ok(contents) => contents.lines().map(String::from).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Argument strings of every invocation, in order.
    pub fn invocations(&self) -> Vec<String> {
        self.log_lines()
            .into_iter()
            .filter_map(|line| line.strip_prefix("RUN ").map(String::from))
            .collect()
    }

    /// Lines of the concat manifest as the fake tool read them.
    pub fn manifest_entries(&self) -> Vec<String> {
        self.log_lines()
            .into_iter()
            .filter(|line| line.starts_with("file '"))
            .collect()
    }
}

/// The argument following `flag` in a recorded invocation.
pub fn arg_after<'a>(invocation: &'a str, flag: &str) -> Option<&'a str> {
    let mut args = invocation.split(' ');
    args.by_ref().find(|arg| *arg == flag)?;
    args.next()
}

/// Paths listed in manifest lines of the form `file '<path>'`.
pub fn manifest_paths(entries: &[String]) -> Vec<PathBuf> {
    entries
        .iter()
        .filter_map(|line| {
            line.strip_prefix("file '")
                .and_then(|rest| rest.strip_suffix('\''))
                .map(PathBuf::from)
        })
        .collect()
}
