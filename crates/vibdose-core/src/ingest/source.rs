//! Log file enumeration
//!
//! Imports read files in case-insensitive name order, which for the logger's
//! naming scheme is also chronological order.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors enumerating a log directory
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Cannot read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Whether a path carries the accepted extension (case-insensitive)
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

fn sort_by_name(files: &mut [PathBuf]) {
    files.sort_by_cached_key(|p| {
        p.file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });
}

/// List every log file in a directory
///
/// Sub-directories and files with other extensions are ignored.
pub fn collect_log_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, SourceError> {
    let entries = std::fs::read_dir(dir).map_err(|source| SourceError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, extension))
        .collect();
    sort_by_name(&mut files);

    tracing::debug!(dir = %dir.display(), count = files.len(), "Enumerated log files");
    Ok(files)
}

/// Resolve an explicit selection of file names against a directory
///
/// Absolute names are kept as given. The extension filter and ordering
/// match [`collect_log_files`].
pub fn resolve_files<S: AsRef<Path>>(dir: &Path, names: &[S], extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = names
        .iter()
        .map(|name| dir.join(name.as_ref()))
        .filter(|path| has_extension(path, extension))
        .collect();
    sort_by_name(&mut files);
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("a.csv"), "csv"));
        assert!(has_extension(Path::new("A.CSV"), "csv"));
        assert!(!has_extension(Path::new("a.txt"), "csv"));
        assert!(!has_extension(Path::new("csv"), "csv"));
    }

    #[test]
    fn test_collect_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.CSV", "a.csv", "C.csv", "notes.txt", "Exclude.sqlite"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.csv")).unwrap();

        let files = collect_log_files(dir.path(), "csv").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.CSV", "C.csv"]);
    }

    #[test]
    fn test_collect_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            collect_log_files(&missing, "csv"),
            Err(SourceError::ReadDir { .. })
        ));
    }

    #[test]
    fn test_resolve_files() {
        let dir = Path::new("/logs");
        let files = resolve_files(dir, &["z.csv", "readme.md", "A.Csv"], "csv");
        assert_eq!(
            files,
            vec![PathBuf::from("/logs/A.Csv"), PathBuf::from("/logs/z.csv")]
        );
    }
}
