//! Input file validation.
//!
//! Every input is checked before any external process is started, so a typo
//! in the last argument fails the run without wasting an encode.

use crate::constants::AUDIO_EXTENSIONS;
use crate::error::{ConcatError, Result};
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// An input that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInput {
    /// Absolute path of the input file
    pub path: PathBuf,
    /// Size in bytes at validation time
    pub size: u64,
    /// Whether the extension is one of [`AUDIO_EXTENSIONS`]
    pub recognized: bool,
}

/// Check that `path` exists, is a regular file and can be opened.
///
/// # Returns
///
/// * `Ok(ValidatedInput)` if the file is usable; an unrecognized extension
///   only logs a warning
/// * `Err(ConcatError::NotFound)` if nothing exists at `path`
/// * `Err(ConcatError::NotRegularFile)` for directories and special files
/// * `Err(ConcatError::NotReadable)` if the file cannot be opened
pub fn validate_input_file(path: &Path) -> Result<ValidatedInput> {
    let abs_path = std::path::absolute(path)?;

    let metadata = match fs::metadata(&abs_path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ConcatError::NotFound(abs_path));
        }
        Err(e) => {
            return Err(ConcatError::NotReadable {
                path: abs_path,
                source: e,
            });
        }
    };

    if !metadata.is_file() {
        return Err(ConcatError::NotRegularFile(abs_path));
    }

    if let Err(e) = File::open(&abs_path) {
        return Err(ConcatError::NotReadable {
            path: abs_path,
            source: e,
        });
    }

    let recognized = has_audio_extension(&abs_path);
    if !recognized {
        log::warn!(
            "File {} does not have a common audio extension ({})",
            abs_path.display(),
            extension_label(&abs_path)
        );
    }

    Ok(ValidatedInput {
        path: abs_path,
        size: metadata.len(),
        recognized,
    })
}

/// Case-insensitive membership test against [`AUDIO_EXTENSIONS`].
pub fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
}

fn extension_label(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_else(|| "none".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_regular_audio_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("take.wav");
        fs::write(&file_path, b"RIFF").unwrap();

        let input = validate_input_file(&file_path).unwrap();
        assert!(input.path.is_absolute());
        assert_eq!(input.size, 4);
        assert!(input.recognized);
    }

    #[test]
    fn test_validate_missing_file() {
        let path = Path::new("/this/path/does/not/exist/hopefully/12345.wav");
        let result = validate_input_file(path);
        assert!(matches!(result, Err(ConcatError::NotFound(_))));
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_validate_directory_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let result = validate_input_file(temp_dir.path());
        assert!(matches!(result, Err(ConcatError::NotRegularFile(_))));
    }

    #[test]
    fn test_unknown_extension_still_passes() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("notes.txt");
        fs::write(&file_path, "test").unwrap();

        let input = validate_input_file(&file_path).unwrap();
        assert!(!input.recognized);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("locked.flac");
        fs::write(&file_path, "test").unwrap();
        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits, so only assert when the open really fails
        if File::open(&file_path).is_err() {
            let result = validate_input_file(&file_path);
            assert!(matches!(result, Err(ConcatError::NotReadable { .. })));
        }
    }

    #[test]
    fn test_has_audio_extension_is_case_insensitive() {
        assert!(has_audio_extension(Path::new("a/B.MP3")));
        assert!(has_audio_extension(Path::new("song.Opus")));
        assert!(!has_audio_extension(Path::new("song.aiff")));
        assert!(!has_audio_extension(Path::new("README")));
    }
}
