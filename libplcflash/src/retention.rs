use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::error::RetentionError;
use super::sink::AuditSink;

/// What one retention pass did. Recomputed from the filesystem on every
/// invocation; there is no persisted state.
#[derive(Debug, Clone, Default)]
pub struct RetentionSummary {
    pub retained: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Keep the `keep` most-recently-created files with the given extension
/// directly in `dir` and delete the rest, reporting each decision to the
/// sink.
///
/// The extension must include the leading separator (e.g. `".txt"`). Files
/// are ranked by creation timestamp descending, falling back to the
/// modification timestamp on filesystems without a birth time; ties are
/// broken by file name, descending, so the ordering is stable. `keep == 0`
/// deletes every matching file. The listing is non-recursive and files are
/// only ever kept or deleted, never renamed.
///
/// A single file's deletion failure (locked, permission denied) is logged
/// and skipped; the remaining deletions still run.
pub fn enforce_retention(
    dir: &Path,
    extension: &str,
    keep: usize,
    sink: &AuditSink,
) -> Result<RetentionSummary, RetentionError> {
    if !extension.starts_with('.') {
        return Err(RetentionError::BadExtension(extension.to_string()));
    }
    if !dir.is_dir() {
        return Err(RetentionError::BadDirectory(dir.to_path_buf()));
    }

    let mut matches: Vec<(PathBuf, SystemTime, u64)> = Vec::new();
    for item in dir.read_dir()? {
        let path = item?.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        if !name.ends_with(extension) {
            continue;
        }
        let meta = path.metadata()?;
        let created = meta.created().or_else(|_| meta.modified())?;
        matches.push((path, created, meta.len()));
    }

    // Newest first; name breaks timestamp ties so the order is deterministic
    matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

    sink.line(&format!(
        "Retention: keeping up to {} {} file(s) in {}",
        keep,
        extension,
        dir.to_string_lossy()
    ));

    let mut summary = RetentionSummary::default();
    for (index, (path, _, size)) in matches.into_iter().enumerate() {
        let name = path.file_name().unwrap_or_default().to_string_lossy().into_owned();
        if index < keep {
            sink.line(&format!(
                "Retaining {} ({})",
                name,
                human_bytes::human_bytes(size as f64)
            ));
            summary.retained.push(path);
        } else {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    sink.line(&format!(
                        "Deleted {} ({})",
                        name,
                        human_bytes::human_bytes(size as f64)
                    ));
                    summary.deleted.push(path);
                }
                Err(e) => {
                    sink.error(&format!("Could not delete {}: {}", name, e));
                    summary.failed.push(path);
                }
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_files(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), name.as_bytes()).unwrap();
            // keep creation timestamps strictly ordered
            std::thread::sleep(std::time::Duration::from_millis(15));
        }
    }

    fn test_sink(dir: &Path) -> AuditSink {
        AuditSink::new(&dir.join("reports"), "retention_test").unwrap()
    }

    #[test]
    fn test_keeps_most_recent_k() {
        let dir = tempfile::tempdir().unwrap();
        let sink = test_sink(dir.path());
        make_files(dir.path(), &["a.ACD", "b.ACD", "c.ACD", "d.ACD"]);

        let summary = enforce_retention(dir.path(), ".ACD", 2, &sink).unwrap();
        assert_eq!(summary.retained.len(), 2);
        assert_eq!(summary.deleted.len(), 2);
        assert!(dir.path().join("c.ACD").exists());
        assert!(dir.path().join("d.ACD").exists());
        assert!(!dir.path().join("a.ACD").exists());
        assert!(!dir.path().join("b.ACD").exists());
    }

    #[test]
    fn test_zero_deletes_all_matching_only() {
        let dir = tempfile::tempdir().unwrap();
        let sink = test_sink(dir.path());
        make_files(dir.path(), &["a.ACD", "b.ACD", "keep.txt"]);

        let summary = enforce_retention(dir.path(), ".ACD", 0, &sink).unwrap();
        assert_eq!(summary.retained.len(), 0);
        assert_eq!(summary.deleted.len(), 2);
        assert!(dir.path().join("keep.txt").exists());
    }

    #[test]
    fn test_keep_larger_than_population() {
        let dir = tempfile::tempdir().unwrap();
        let sink = test_sink(dir.path());
        make_files(dir.path(), &["a.ACD", "b.ACD"]);

        let summary = enforce_retention(dir.path(), ".ACD", 10, &sink).unwrap();
        assert_eq!(summary.retained.len(), 2);
        assert!(summary.deleted.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let sink = test_sink(dir.path());
        make_files(dir.path(), &["a.ACD", "b.ACD", "c.ACD"]);

        let first = enforce_retention(dir.path(), ".ACD", 2, &sink).unwrap();
        let second = enforce_retention(dir.path(), ".ACD", 2, &sink).unwrap();
        assert_eq!(first.retained, second.retained);
        assert!(second.deleted.is_empty());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = test_sink(dir.path());
        let result = enforce_retention(&dir.path().join("nope"), ".ACD", 2, &sink);
        assert!(matches!(result, Err(RetentionError::BadDirectory(_))));
    }

    #[test]
    fn test_extension_requires_separator() {
        let dir = tempfile::tempdir().unwrap();
        let sink = test_sink(dir.path());
        let result = enforce_retention(dir.path(), "ACD", 2, &sink);
        assert!(matches!(result, Err(RetentionError::BadExtension(_))));
    }
}
