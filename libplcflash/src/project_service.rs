use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::Command;

use super::error::ProjectServiceError;

/// Operating state of a controller-class device. Program and Run are the two
/// states the provisioning sequence cares about; anything else the bridge
/// reports is carried through for the error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatingMode {
    Program,
    Run,
    Other(String),
}

impl OperatingMode {
    pub fn parse(s: &str) -> Self {
        match s {
            "Program" => OperatingMode::Program,
            "Run" => OperatingMode::Run,
            other => OperatingMode::Other(other.to_string()),
        }
    }
}

impl Display for OperatingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OperatingMode::Program => write!(f, "Program"),
            OperatingMode::Run => write!(f, "Run"),
            OperatingMode::Other(s) => write!(f, "{}", s),
        }
    }
}

/// The controller project operations the orchestrator needs from the vendor
/// SDK. The SDK itself is an opaque external collaborator; this trait is the
/// seam between the provisioning sequence and whatever reaches it.
pub trait ProjectService {
    /// Upload the project currently on the device to a local artifact.
    fn upload_project(&self, comm_path: &str, dest: &Path) -> Result<(), ProjectServiceError>;

    /// Query the device's current operating mode.
    fn operating_mode(&self, comm_path: &str) -> Result<OperatingMode, ProjectServiceError>;

    /// Request a transition to the given operating mode.
    fn set_operating_mode(
        &self,
        comm_path: &str,
        mode: OperatingMode,
    ) -> Result<(), ProjectServiceError>;

    /// Convert a project artifact to the target major revision, writing the
    /// converted project to `dest`.
    fn convert_project(
        &self,
        src: &Path,
        dest: &Path,
        major_revision: u16,
    ) -> Result<(), ProjectServiceError>;

    /// Open a project artifact, download it to the device, and save.
    fn download_project(&self, comm_path: &str, project: &Path)
        -> Result<(), ProjectServiceError>;
}

/// [`ProjectService`] implementation that reaches the vendor SDK through a
/// bridge executable, invoked once per operation with positional arguments:
///
/// ```text
/// bridge upload   <comm_path> <dest>
/// bridge get-mode <comm_path>            # prints the mode on stdout
/// bridge set-mode <comm_path> <mode>
/// bridge convert  <src> <dest> <major>
/// bridge download <comm_path> <project>
/// ```
///
/// A non-zero exit maps to [`ProjectServiceError::OperationFailed`] carrying
/// the operation name and the bridge's stderr.
#[derive(Debug, Clone)]
pub struct BridgeService {
    bridge_path: PathBuf,
}

impl BridgeService {
    pub fn new(bridge_path: &Path) -> Self {
        Self {
            bridge_path: bridge_path.to_path_buf(),
        }
    }

    fn run(&self, op: &'static str, args: &[&str]) -> Result<String, ProjectServiceError> {
        let output = Command::new(&self.bridge_path).arg(op).args(args).output()?;
        if !output.status.success() {
            return Err(ProjectServiceError::OperationFailed {
                op,
                code: output.status.code(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl ProjectService for BridgeService {
    fn upload_project(&self, comm_path: &str, dest: &Path) -> Result<(), ProjectServiceError> {
        self.run("upload", &[comm_path, &dest.to_string_lossy()])?;
        Ok(())
    }

    fn operating_mode(&self, comm_path: &str) -> Result<OperatingMode, ProjectServiceError> {
        let stdout = self.run("get-mode", &[comm_path])?;
        if stdout.is_empty() {
            return Err(ProjectServiceError::BadMode(stdout));
        }
        Ok(OperatingMode::parse(&stdout))
    }

    fn set_operating_mode(
        &self,
        comm_path: &str,
        mode: OperatingMode,
    ) -> Result<(), ProjectServiceError> {
        self.run("set-mode", &[comm_path, &mode.to_string()])?;
        Ok(())
    }

    fn convert_project(
        &self,
        src: &Path,
        dest: &Path,
        major_revision: u16,
    ) -> Result<(), ProjectServiceError> {
        self.run(
            "convert",
            &[
                &src.to_string_lossy(),
                &dest.to_string_lossy(),
                &major_revision.to_string(),
            ],
        )?;
        Ok(())
    }

    fn download_project(
        &self,
        comm_path: &str,
        project: &Path,
    ) -> Result<(), ProjectServiceError> {
        self.run("download", &[comm_path, &project.to_string_lossy()])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!(OperatingMode::parse("Program"), OperatingMode::Program);
        assert_eq!(OperatingMode::parse("Run"), OperatingMode::Run);
        assert_eq!(
            OperatingMode::parse("Faulted"),
            OperatingMode::Other(String::from("Faulted"))
        );
        assert_eq!(OperatingMode::Program.to_string(), "Program");
    }

    #[cfg(unix)]
    #[test]
    fn test_bridge_reports_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("bridge.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\nif [ \"$1\" = \"get-mode\" ]; then echo Program; exit 0; fi\nexit 0\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let service = BridgeService::new(&script);
        let mode = service.operating_mode("AB_ETH-1!10.0.0.2").unwrap();
        assert_eq!(mode, OperatingMode::Program);
    }

    #[cfg(unix)]
    #[test]
    fn test_bridge_failure_carries_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("bridge.sh");
        std::fs::write(&script, "#!/bin/sh\necho \"no route to device\" >&2\nexit 7\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let service = BridgeService::new(&script);
        let result = service.upload_project("AB_ETH-1!10.0.0.2", Path::new("/tmp/out.ACD"));
        match result {
            Err(ProjectServiceError::OperationFailed { op, code, detail }) => {
                assert_eq!(op, "upload");
                assert_eq!(code, Some(7));
                assert_eq!(detail, "no route to device");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
