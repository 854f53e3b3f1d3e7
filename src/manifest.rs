//! The concat demuxer's list file.
//!
//! Each entry is a `file '<path>'` line. Inside the single-quoted path a
//! literal quote is written as `'\''`, the same escaping the demuxer's own
//! tokenizer undoes.

use crate::error::{ConcatError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A written concatenation list. The file is deleted when this is dropped.
pub struct Manifest {
    file: NamedTempFile,
}

impl Manifest {
    /// Write a manifest listing `entries` in order.
    ///
    /// The file is created in the system temporary directory with a
    /// `concat-list-` prefix. Entries must be valid UTF-8.
    pub fn write(entries: &[PathBuf]) -> Result<Self> {
        let contents = render_manifest(entries)?;

        let mut file = tempfile::Builder::new()
            .prefix("concat-list-")
            .suffix(".txt")
            .tempfile()
            .map_err(|e| ConcatError::TempResource {
                what: "concatenation list",
                source: e,
            })?;

        file.write_all(contents.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| ConcatError::Manifest {
                path: file.path().to_path_buf(),
                source: e,
            })?;

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Re-read the list from disk, as the demuxer will see it.
    pub fn read_back(&self) -> Result<String> {
        std::fs::read_to_string(self.path()).map_err(|e| ConcatError::Manifest {
            path: self.path().to_path_buf(),
            source: e,
        })
    }
}

/// Render the list file for `entries`.
///
/// The list is a text file, so a path that is not valid UTF-8 is rejected
/// rather than rewritten into a different path.
pub fn render_manifest(entries: &[PathBuf]) -> Result<String> {
    let mut out = String::new();
    for entry in entries {
        let path = entry
            .to_str()
            .ok_or_else(|| ConcatError::NonUtf8Path(entry.clone()))?;
        out.push_str("file '");
        out.push_str(&path.replace('\'', r"'\''"));
        out.push_str("'\n");
    }
    Ok(out)
}
