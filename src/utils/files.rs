//! File size helpers for verbose reporting.

use std::fs;
use std::path::Path;

/// Format a byte count as megabytes with two decimals, e.g. `"1.50 MB"`.
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

/// Log the size and location of a file at info level.
///
/// Missing files are skipped silently; this is only ever informational.
pub fn log_file_size(path: &Path, label: &str) {
    if let Ok(metadata) = fs::metadata(path) {
        log::info!("{label} file size: {}", format_megabytes(metadata.len()));
        log::info!("{label} file location: {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_megabytes() {
        assert_eq!(format_megabytes(0), "0.00 MB");
        assert_eq!(format_megabytes(1024 * 1024), "1.00 MB");
        assert_eq!(format_megabytes(1024 * 1024 * 3 / 2), "1.50 MB");
    }

    #[test]
    fn test_log_file_size_ignores_missing_file() {
        log_file_size(Path::new("/no/such/file.flac"), "Output");
    }
}
