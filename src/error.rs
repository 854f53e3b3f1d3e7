//! Error type shared by every stage of a concatenation run.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors that halt a concatenation run.
#[derive(Debug, Error)]
pub enum ConcatError {
    /// Fewer than two input files were supplied.
    #[error("at least two input files are required, got {0}")]
    NotEnoughInputs(usize),

    #[error("file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("file is not readable: {}", .path.display())]
    NotReadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("path is not a regular file: {}", .0.display())]
    NotRegularFile(PathBuf),

    /// The output path already exists and overwriting was not allowed.
    #[error("output file already exists: {} (pass --overwrite to replace it)", .0.display())]
    OutputExists(PathBuf),

    #[error("output file is also an input: {}", .0.display())]
    OutputIsInput(PathBuf),

    #[error("failed to create temporary {what}: {source}")]
    TempResource {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The external tool could not be spawned at all.
    #[error("failed to start {program}: {source}")]
    ToolStart {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external tool ran but exited unsuccessfully.
    #[error("{label} failed ({status}){}", format_detail(.detail))]
    ExternalToolFailure {
        label: String,
        status: ExitStatus,
        detail: String,
    },

    #[error("failed to write concatenation list {}: {source}", .path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// The finished output could not be moved into place.
    #[error("failed to move result into {}: {source}", .path.display())]
    Publish {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_detail(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(": {detail}")
    }
}

pub type Result<T> = std::result::Result<T, ConcatError>;
