#![cfg(unix)]

mod common;

use aconcat::ConcatError;
use aconcat::config::ConcatConfig;
use aconcat::pipeline;
use aconcat::progress::{ProgressSource, SilentProgress};
use aconcat::utils::progress::BarReporter;
use common::{FakeFfmpeg, arg_after, manifest_paths, write_test_tone};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn last_arg(invocation: &str) -> &str {
    invocation.rsplit(' ').next().unwrap()
}

struct Fixture {
    _tool_dir: TempDir,
    input_dir: TempDir,
    output_dir: TempDir,
    ffmpeg: FakeFfmpeg,
    inputs: Vec<PathBuf>,
}

impl Fixture {
    fn new(names: &[&str], fail_on: Option<&str>) -> Self {
        let tool_dir = TempDir::new().unwrap();
        let input_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        let ffmpeg = FakeFfmpeg::install_failing(tool_dir.path(), fail_on);

        let inputs = names
            .iter()
            .map(|name| {
                let path = input_dir.path().join(name);
                write_test_tone(&path, 8_000, 250);
                path
            })
            .collect();

        Self {
            _tool_dir: tool_dir,
            input_dir,
            output_dir,
            ffmpeg,
            inputs,
        }
    }

    fn output(&self, name: &str) -> PathBuf {
        self.output_dir.path().join(name)
    }

    fn config(&self, output: &Path) -> ConcatConfig {
        ConcatConfig::builder(self.inputs.clone(), output)
            .ffmpeg(&self.ffmpeg.program)
            .build()
            .unwrap()
    }

    fn overwrite_config(&self, output: &Path) -> ConcatConfig {
        ConcatConfig::builder(self.inputs.clone(), output)
            .ffmpeg(&self.ffmpeg.program)
            .overwrite(true)
            .build()
            .unwrap()
    }

    fn output_dir_entries(&self) -> Vec<PathBuf> {
        let mut entries: Vec<_> = fs::read_dir(self.output_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        entries.sort();
        entries
    }
}

#[test]
fn flac_output_skips_final_encode_and_cleans_up() {
    let fixture = Fixture::new(&["one.wav", "two.wav", "three.wav"], None);
    let output = fixture.output("joined.flac");

    let summary = pipeline::run(&fixture.config(&output), &mut SilentProgress).unwrap();

    assert_eq!(summary.output, output);
    assert_eq!(summary.inputs, 3);
    assert!(!summary.final_encode);
    assert!(summary.output_size > 0);

    // Exactly one file produced at the requested path
    assert_eq!(fixture.output_dir_entries(), [output.clone()]);

    let runs = fixture.ffmpeg.invocations();
    assert_eq!(runs.len(), 4, "three re-encodes and one concat: {runs:?}");
    for (run, input) in runs.iter().zip(&fixture.inputs) {
        assert_eq!(arg_after(run, "-i"), Some(input.to_str().unwrap()));
        assert_eq!(arg_after(run, "-ar"), Some("48000"));
        assert_eq!(arg_after(run, "-ac"), Some("2"));
        assert_eq!(arg_after(run, "-c:a"), Some("flac"));
    }
    assert!(runs[3].contains("-f concat -safe 0"));

    // The concat product was staged under the output's name, then moved
    let staged = PathBuf::from(last_arg(&runs[3]));
    assert_eq!(staged.file_name(), output.file_name());
    assert_ne!(staged, output);
    assert!(!staged.exists());

    // The manifest listed the intermediates in input order
    let listed = manifest_paths(&fixture.ffmpeg.manifest_entries());
    let names: Vec<_> = listed
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        [
            "one.wav_converted.flac",
            "two.wav_converted.flac",
            "three.wav_converted.flac"
        ]
    );

    // No temporary state survives the run
    for intermediate in &listed {
        assert!(!intermediate.exists());
    }
    assert!(!listed[0].parent().unwrap().exists());
    let manifest = PathBuf::from(arg_after(&runs[3], "-i").unwrap());
    assert!(!manifest.exists());

    // Inputs are untouched
    assert_eq!(fs::read_dir(fixture.input_dir.path()).unwrap().count(), 3);
}

#[test]
fn other_extension_runs_final_encode() {
    let fixture = Fixture::new(&["a.mp3", "b.wav"], None);
    let output = fixture.output("joined.MP3");

    let config = ConcatConfig::builder(fixture.inputs.clone(), &output)
        .ffmpeg(&fixture.ffmpeg.program)
        .sample_rate(44_100)
        .channels(1)
        .build()
        .unwrap();
    let summary = pipeline::run(&config, &mut SilentProgress).unwrap();
    assert!(summary.final_encode);

    let runs = fixture.ffmpeg.invocations();
    assert_eq!(runs.len(), 4, "two re-encodes, concat, final: {runs:?}");
    assert_eq!(arg_after(&runs[0], "-ar"), Some("44100"));
    assert_eq!(arg_after(&runs[0], "-ac"), Some("1"));

    let combined = last_arg(&runs[2]).to_string();
    assert!(combined.ends_with("combined.flac"));
    assert_eq!(arg_after(&runs[3], "-i"), Some(combined.as_str()));

    // The final encode keeps the requested extension so ffmpeg picks the format
    let staged = PathBuf::from(last_arg(&runs[3]));
    assert_eq!(staged.file_name(), output.file_name());
    assert_ne!(staged, output);

    assert!(!Path::new(&combined).exists());
    assert!(!staged.exists());
    assert_eq!(fixture.output_dir_entries(), [output]);
}

#[test]
fn duplicate_file_names_get_distinct_intermediates() {
    let fixture = Fixture::new(&["take.wav"], None);
    let nested = fixture.input_dir.path().join("second");
    fs::create_dir(&nested).unwrap();
    let other = nested.join("take.wav");
    write_test_tone(&other, 8_000, 100);

    let inputs = vec![fixture.inputs[0].clone(), other];
    let config = ConcatConfig::builder(inputs, fixture.output("out.flac"))
        .ffmpeg(&fixture.ffmpeg.program)
        .build()
        .unwrap();
    pipeline::run(&config, &mut SilentProgress).unwrap();

    let listed = manifest_paths(&fixture.ffmpeg.manifest_entries());
    assert_eq!(listed.len(), 2);
    assert_ne!(listed[0], listed[1]);
}

#[test]
fn reencode_failure_halts_and_leaves_nothing() {
    let fixture = Fixture::new(&["good.wav", "bad.wav", "never.wav"], Some("bad.wav"));
    let output = fixture.output("out.flac");

    let err = pipeline::run(&fixture.config(&output), &mut SilentProgress).unwrap_err();
    match err {
        ConcatError::ExternalToolFailure { label, detail, .. } => {
            assert_eq!(label, "Re-encoding file 2/3");
            assert!(detail.contains("simulated failure"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // No retry and no later phases
    let runs = fixture.ffmpeg.invocations();
    assert_eq!(runs.len(), 2);
    assert!(fixture.ffmpeg.manifest_entries().is_empty());
    assert!(fixture.output_dir_entries().is_empty());

    let intermediate = PathBuf::from(last_arg(&runs[0]));
    assert!(!intermediate.parent().unwrap().exists());
}

#[test]
fn concat_failure_removes_partial_output() {
    let fixture = Fixture::new(&["a.wav", "b.wav"], Some("-f concat"));
    let output = fixture.output("out.flac");

    let err = pipeline::run(&fixture.config(&output), &mut SilentProgress).unwrap_err();
    assert!(matches!(err, ConcatError::ExternalToolFailure { .. }));
    assert!(!output.exists());
    assert_eq!(fixture.ffmpeg.invocations().len(), 3);
}

#[test]
fn failed_concat_keeps_the_existing_output() {
    let fixture = Fixture::new(&["a.wav", "b.wav"], Some("-f concat"));
    let output = fixture.output("out.flac");
    fs::write(&output, b"previous take").unwrap();

    let err = pipeline::run(&fixture.overwrite_config(&output), &mut SilentProgress).unwrap_err();
    assert!(matches!(err, ConcatError::ExternalToolFailure { .. }));

    assert_eq!(fs::read(&output).unwrap(), b"previous take");
    assert_eq!(fixture.output_dir_entries(), [output]);
}

#[test]
fn failed_final_encode_keeps_the_existing_output() {
    let fixture = Fixture::new(&["a.wav", "b.wav"], Some("combined.flac -progress"));
    let output = fixture.output("out.mp3");
    fs::write(&output, b"previous take").unwrap();

    let err = pipeline::run(&fixture.overwrite_config(&output), &mut SilentProgress).unwrap_err();
    match err {
        ConcatError::ExternalToolFailure { label, .. } => assert_eq!(label, "Final encoding"),
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(fixture.ffmpeg.invocations().len(), 4);
    assert_eq!(fs::read(&output).unwrap(), b"previous take");
    assert_eq!(fixture.output_dir_entries(), [output]);
}

#[test]
fn successful_overwrite_replaces_the_output() {
    let fixture = Fixture::new(&["a.wav", "b.wav"], None);
    let output = fixture.output("out.flac");
    fs::write(&output, b"previous take").unwrap();

    let summary = pipeline::run(&fixture.overwrite_config(&output), &mut SilentProgress).unwrap();

    assert_eq!(fs::read(&output).unwrap(), b"fake audio\n");
    assert_eq!(summary.output_size, b"fake audio\n".len() as u64);
    assert_eq!(fixture.output_dir_entries(), [output]);
}

#[test]
fn missing_input_never_invokes_the_tool() {
    let fixture = Fixture::new(&["a.wav"], None);
    let mut inputs = fixture.inputs.clone();
    inputs.push(fixture.input_dir.path().join("missing.wav"));

    let config = ConcatConfig::builder(inputs, fixture.output("out.flac"))
        .ffmpeg(&fixture.ffmpeg.program)
        .build()
        .unwrap();
    let err = pipeline::run(&config, &mut SilentProgress).unwrap_err();

    assert!(matches!(err, ConcatError::NotFound(_)));
    assert!(fixture.ffmpeg.invocations().is_empty());
}

#[test]
fn ticker_progress_source_completes_every_phase() {
    let fixture = Fixture::new(&["a.wav", "b.wav"], None);
    let output = fixture.output("out.ogg");

    let config = ConcatConfig::builder(fixture.inputs.clone(), &output)
        .ffmpeg(&fixture.ffmpeg.program)
        .progress(ProgressSource::Ticker)
        .verbose(true)
        .build()
        .unwrap();
    let mut reporter = BarReporter::hidden(Duration::from_millis(5));
    pipeline::run(&config, &mut reporter).unwrap();

    assert!(!reporter.is_ticking());
    assert_eq!(reporter.position(), Some(100));
    assert!(output.exists());
}

#[test]
fn ticker_stops_when_a_phase_fails() {
    let fixture = Fixture::new(&["a.wav", "b.wav"], Some("b.wav"));
    let output = fixture.output("out.flac");

    let config = ConcatConfig::builder(fixture.inputs.clone(), &output)
        .ffmpeg(&fixture.ffmpeg.program)
        .progress(ProgressSource::Ticker)
        .build()
        .unwrap();
    let mut reporter = BarReporter::hidden(Duration::from_millis(1));
    let err = pipeline::run(&config, &mut reporter).unwrap_err();
    assert!(matches!(err, ConcatError::ExternalToolFailure { .. }));

    // The failed phase's ticker was joined, so its bar no longer moves
    assert!(!reporter.is_ticking());
    let stopped_at = reporter.position().unwrap();
    assert!(stopped_at < 100);
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(reporter.position(), Some(stopped_at));
    assert!(!output.exists());
}
