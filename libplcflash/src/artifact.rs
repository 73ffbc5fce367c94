use std::path::{Path, PathBuf};

use time::macros::format_description;
use time::OffsetDateTime;

use super::error::ContextError;

/// Replace the characters the vendor tools choke on in file names (`!`, `\`,
/// `-`, `.`) with underscores so a communication path can name an artifact.
pub fn sanitize_comm_path(comm_path: &str) -> String {
    comm_path
        .chars()
        .map(|c| match c {
            '!' | '\\' | '-' | '.' => '_',
            c => c,
        })
        .collect()
}

/// Per-run state shared by the orchestrator and the audit sink: the run
/// timestamp used to stamp every generated file, the directory project
/// artifacts land in, and the project file extension.
///
/// Constructed once at startup and passed down explicitly; nothing in the
/// library reads ambient process-wide state.
#[derive(Debug, Clone)]
pub struct RunContext {
    stamp: String,
    artifact_dir: PathBuf,
    project_extension: String,
}

impl RunContext {
    /// Create a context stamped with the current UTC time, creating the
    /// artifact directory if it does not exist yet.
    pub fn new(artifact_dir: &Path, project_extension: &str) -> Result<Self, ContextError> {
        let stamp = OffsetDateTime::now_utc()
            .format(format_description!("[year][month][day]_[hour][minute][second]"))?;
        std::fs::create_dir_all(artifact_dir)?;
        Ok(Self {
            stamp,
            artifact_dir: artifact_dir.to_path_buf(),
            project_extension: project_extension.to_string(),
        })
    }

    /// Context with a caller-supplied stamp. Used by tests that need
    /// deterministic artifact names.
    pub fn with_stamp(
        stamp: &str,
        artifact_dir: &Path,
        project_extension: &str,
    ) -> Result<Self, ContextError> {
        std::fs::create_dir_all(artifact_dir)?;
        Ok(Self {
            stamp: stamp.to_string(),
            artifact_dir: artifact_dir.to_path_buf(),
            project_extension: project_extension.to_string(),
        })
    }

    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    pub fn project_extension(&self) -> &str {
        &self.project_extension
    }

    /// Path for the project uploaded from a device before flashing.
    pub fn upload_artifact(&self, comm_path: &str) -> PathBuf {
        self.artifact_dir.join(format!(
            "{}_{}.{}",
            self.stamp,
            sanitize_comm_path(comm_path),
            self.project_extension
        ))
    }

    /// Path for the project converted to the target major revision.
    pub fn converted_artifact(&self, comm_path: &str, major_revision: u16) -> PathBuf {
        self.artifact_dir.join(format!(
            "{}_{}_v{}.{}",
            self.stamp,
            sanitize_comm_path(comm_path),
            major_revision,
            self.project_extension
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_comm_path() {
        assert_eq!(
            sanitize_comm_path("AB_ETH-1!192.168.1.10"),
            "AB_ETH_1_192_168_1_10"
        );
        assert_eq!(sanitize_comm_path(r"USB\16"), "USB_16");
    }

    #[test]
    fn test_artifact_names() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::with_stamp("20260825_120000", dir.path(), "ACD").unwrap();
        assert_eq!(
            ctx.upload_artifact("AB_ETH-1!192.168.1.10"),
            dir.path().join("20260825_120000_AB_ETH_1_192_168_1_10.ACD")
        );
        assert_eq!(
            ctx.converted_artifact("AB_ETH-1!192.168.1.10", 33),
            dir.path()
                .join("20260825_120000_AB_ETH_1_192_168_1_10_v33.ACD")
        );
    }

    #[test]
    fn test_new_creates_artifact_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("artifacts");
        let ctx = RunContext::new(&nested, "ACD").unwrap();
        assert!(nested.is_dir());
        assert_eq!(ctx.stamp().len(), "20260825_120000".len());
    }
}
