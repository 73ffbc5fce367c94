use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc::{channel, Sender};

use super::error::FlashToolError;
use super::sink::AuditSink;

/// Structured result of one flash-tool invocation. The orchestrator decides
/// success or failure from the exit code; the tool's output has already been
/// forwarded to the audit sink line by line.
#[derive(Debug, Clone, Default)]
pub struct FlashOutput {
    pub exit_code: Option<i32>,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl FlashOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

enum ToolLine {
    Out(String),
    Err(String),
}

/// Driver for the external firmware-flash executable.
///
/// The tool is invoked once per device with two positional arguments
/// (communication path, target revision). Its stdout and stderr are drained
/// concurrently by two reader threads so neither pipe can fill up and stall
/// the tool; the invocation itself blocks until the tool exits. There is no
/// timeout: a hung tool blocks the batch.
#[derive(Debug, Clone)]
pub struct FlashTool {
    tool_path: PathBuf,
}

impl FlashTool {
    pub fn new(tool_path: &Path) -> Self {
        Self {
            tool_path: tool_path.to_path_buf(),
        }
    }

    /// Run the tool against one device, streaming its output to the sink.
    pub fn flash(
        &self,
        comm_path: &str,
        revision: &str,
        sink: &AuditSink,
    ) -> Result<FlashOutput, FlashToolError> {
        let mut child = Command::new(&self.tool_path)
            .arg(comm_path)
            .arg(revision)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or(FlashToolError::MissingPipe("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(FlashToolError::MissingPipe("stderr"))?;

        let (tx, rx) = channel::<ToolLine>();
        let err_tx = tx.clone();
        let out_handle = std::thread::spawn(move || drain(stdout, &tx, ToolLine::Out));
        let err_handle = std::thread::spawn(move || drain(stderr, &err_tx, ToolLine::Err));

        let mut output = FlashOutput::default();
        // Both senders live on the drain threads; the loop ends when both
        // pipes are closed.
        for line in rx {
            match line {
                ToolLine::Out(text) => {
                    sink.tool_output(&text);
                    output.stdout.push(text);
                }
                ToolLine::Err(text) => {
                    sink.tool_error(&text);
                    output.stderr.push(text);
                }
            }
        }
        let _ = out_handle.join();
        let _ = err_handle.join();

        let status = child.wait()?;
        output.exit_code = status.code();
        Ok(output)
    }
}

fn drain<R: std::io::Read>(pipe: R, tx: &Sender<ToolLine>, wrap: fn(String) -> ToolLine) {
    for line in BufReader::new(pipe).lines().map_while(Result::ok) {
        if tx.send(wrap(line)).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_output_capture_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let sink = AuditSink::new(dir.path(), "flash_test").unwrap();
        let script = write_script(
            dir.path(),
            "fake_flash.sh",
            "echo \"flashing $1 to $2\"\necho \"device busy\" >&2\nexit 3\n",
        );

        let tool = FlashTool::new(&script);
        let output = tool.flash("AB_ETH-1!10.0.0.2", "33.011", &sink).unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout, vec!["flashing AB_ETH-1!10.0.0.2 to 33.011"]);
        assert_eq!(output.stderr, vec!["device busy"]);

        sink.close();
        let report = std::fs::read_to_string(sink.report_path()).unwrap();
        assert!(report.contains("flashing AB_ETH-1!10.0.0.2 to 33.011"));
        assert!(report.contains("[stderr] device busy"));
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_run() {
        let dir = tempfile::tempdir().unwrap();
        let sink = AuditSink::new(dir.path(), "flash_ok").unwrap();
        let script = write_script(dir.path(), "fake_flash.sh", "echo done\nexit 0\n");

        let output = FlashTool::new(&script)
            .flash("USB\\16", "5.016", &sink)
            .unwrap();
        assert!(output.success());
        assert!(output.stderr.is_empty());
    }

    #[test]
    fn test_missing_tool_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = AuditSink::new(dir.path(), "flash_missing").unwrap();
        let tool = FlashTool::new(Path::new("/definitely/not/a/flash/tool"));
        assert!(matches!(
            tool.flash("path", "1.001", &sink),
            Err(FlashToolError::IOError(_))
        ));
    }
}
