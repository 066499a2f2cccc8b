//! Flat listing of the regular files in one directory.

use crate::error::FilekitError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Files found directly inside a directory (no recursion, no sub-directories).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileListing {
    /// The directory that was listed.
    pub path: PathBuf,
    /// File names, sorted.
    pub files: Vec<String>,
}

impl FileListing {
    /// Plain-text report suitable for saving as `.txt`.
    pub fn report(&self) -> String {
        let mut report = format!("📂 File list: {}\n", self.path.display());
        report.push_str(&format!("🔢 Total: {}\n", self.files.len()));
        report.push_str(&"=".repeat(60));
        report.push_str("\n\n");
        report.push_str(&self.files.join("\n"));
        report
    }
}

/// List the regular files in `dir`, sorted by name.
///
/// Symlinks are followed, so a link to a file is listed and a link to a
/// directory is not.
pub fn list_files(dir: impl AsRef<Path>) -> Result<FileListing, FilekitError> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Err(FilekitError::PathNotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(FilekitError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let entries = fs::read_dir(dir).map_err(|e| FilekitError::from_io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| FilekitError::from_io(dir, e))?;
        if entry.path().is_file() {
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    files.sort();

    debug!("Listed {} files in {}", files.len(), dir.display());
    Ok(FileListing {
        path: dir.to_path_buf(),
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn lists_only_files_sorted() {
        let tmp = TempDir::new().unwrap();
        File::create(tmp.path().join("b.txt")).unwrap();
        File::create(tmp.path().join("a.pdf")).unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();

        let listing = list_files(tmp.path()).unwrap();
        assert_eq!(listing.files, vec!["a.pdf", "b.txt"]);
    }

    #[test]
    fn report_layout() {
        let listing = FileListing {
            path: PathBuf::from("/data"),
            files: vec!["a".into(), "b".into()],
        };
        let report = listing.report();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "📂 File list: /data");
        assert_eq!(lines[1], "🔢 Total: 2");
        assert_eq!(lines[2], "=".repeat(60));
        assert_eq!(lines[3], "");
        assert_eq!(&lines[4..], &["a", "b"]);
    }

    #[test]
    fn empty_directory_has_zero_total() {
        let tmp = TempDir::new().unwrap();
        let listing = list_files(tmp.path()).unwrap();
        assert!(listing.files.is_empty());
        assert!(listing.report().contains("Total: 0"));
    }

    #[test]
    fn errors_for_missing_and_file_paths() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            list_files(tmp.path().join("missing")),
            Err(FilekitError::PathNotFound { .. })
        ));
        let file = tmp.path().join("f.txt");
        File::create(&file).unwrap();
        assert!(matches!(
            list_files(&file),
            Err(FilekitError::NotADirectory { .. })
        ));
    }
}
