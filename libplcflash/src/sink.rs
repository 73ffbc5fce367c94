use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::SinkError;

/// Duplicates every human-readable progress line to the interactive console
/// and a run-stamped report file, so each run leaves a durable audit trail.
///
/// Internally this is a dedicated spdlog logger with a console sink and a
/// file sink. The flush level is set to `All`, so every record is flushed as
/// it is written and nothing is lost if the process dies mid-run. [`close`]
/// flushes explicitly for a clean shutdown; dropping the sink flushes too.
///
/// [`close`]: AuditSink::close
#[derive(Clone)]
pub struct AuditSink {
    logger: Arc<spdlog::Logger>,
    report_path: PathBuf,
}

impl AuditSink {
    /// Acquire the report file `{run_stamp}_provision_report.txt` under
    /// `report_dir` (creating the directory if needed) and start duplicating
    /// output.
    pub fn new(report_dir: &Path, run_stamp: &str) -> Result<Self, SinkError> {
        std::fs::create_dir_all(report_dir)?;
        let report_path = report_dir.join(format!("{}_provision_report.txt", run_stamp));

        let file_sink = Arc::new(
            spdlog::sink::FileSink::builder()
                .path(&report_path)
                .formatter(Box::new(spdlog::formatter::PatternFormatter::new(
                    spdlog::formatter::pattern!(
                        "[{date_short} {time_short}] - [{^{level}}] - {payload}{eol}"
                    ),
                )))
                .truncate(true)
                .build()?,
        );
        let console_sink = Arc::new(
            spdlog::sink::StdStreamSink::builder()
                .std_stream(spdlog::sink::StdStream::Stdout)
                .formatter(Box::new(spdlog::formatter::PatternFormatter::new(
                    spdlog::formatter::pattern!("[{^{level}}] - {payload}{eol}"),
                )))
                .build()?,
        );
        let logger = Arc::new(
            spdlog::Logger::builder()
                .flush_level_filter(spdlog::LevelFilter::All)
                .sink(file_sink)
                .sink(console_sink)
                .build()?,
        );

        Ok(Self {
            logger,
            report_path,
        })
    }

    /// Location of the report file backing this sink.
    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    /// A line of progress output.
    pub fn line(&self, msg: &str) {
        spdlog::info!(logger: self.logger, "{}", msg);
    }

    /// A failure line.
    pub fn error(&self, msg: &str) {
        spdlog::error!(logger: self.logger, "{}", msg);
    }

    /// A standard-output line from an external tool, forwarded verbatim.
    pub fn tool_output(&self, line: &str) {
        spdlog::info!(logger: self.logger, "{}", line);
    }

    /// A standard-error line from an external tool, prefixed so it stands
    /// out in the report.
    pub fn tool_error(&self, line: &str) {
        spdlog::warn!(logger: self.logger, "[stderr] {}", line);
    }

    /// Flush both destinations. Safe to call more than once.
    pub fn close(&self) {
        self.logger.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_reach_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = AuditSink::new(dir.path(), "20260825_120000").unwrap();
        sink.line("Flashing AB_ETH-1!192.168.1.10 to 33.011");
        sink.tool_error("update failed");
        sink.close();

        let contents = std::fs::read_to_string(sink.report_path()).unwrap();
        assert!(contents.contains("Flashing AB_ETH-1!192.168.1.10 to 33.011"));
        assert!(contents.contains("[stderr] update failed"));
    }

    #[test]
    fn test_report_path_is_run_stamped() {
        let dir = tempfile::tempdir().unwrap();
        let sink = AuditSink::new(dir.path(), "stamp").unwrap();
        assert_eq!(
            sink.report_path(),
            dir.path().join("stamp_provision_report.txt")
        );
    }
}
