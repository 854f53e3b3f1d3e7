//! Compatibility for single-dash long flags.
//!
//! The tool has always been invoked as `ac -verbose -output out.wav ...`.
//! clap only understands long flags with two dashes, so known single-dash
//! spellings are rewritten before parsing.

use std::ffi::OsString;

/// Long flags that may also be spelled with a single dash.
const LONG_FLAGS: &[&str] = &[
    "verbose",
    "output",
    "sample-rate",
    "channels",
    "ffmpeg",
    "progress",
    "overwrite",
    "log-file",
    "init-config",
    "completions",
    "help",
    "version",
];

/// Rewrite `-name` and `-name=value` to their `--` form for every known long
/// flag. Arguments after a bare `--` are left untouched.
pub fn normalize_long_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut end_of_flags = false;
    args.into_iter()
        .map(|arg| {
            if end_of_flags {
                return arg;
            }
            if arg == "--" {
                end_of_flags = true;
                return arg;
            }
            match arg.to_str().and_then(rewrite) {
                Some(rewritten) => OsString::from(rewritten),
                None => arg,
            }
        })
        .collect()
}

fn rewrite(arg: &str) -> Option<String> {
    let rest = arg.strip_prefix('-')?;
    if rest.starts_with('-') {
        return None;
    }
    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
    LONG_FLAGS.contains(&name).then(|| format!("-{arg}"))
}
