use std::path::PathBuf;
use thiserror::Error;

use super::policy::ProvisionStage;
use super::status::BatchStatus;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Error)]
pub enum RevisionError {
    #[error("Revision string {0:?} has no major.minor separator")]
    MissingSeparator(String),
    #[error("Revision string {0:?} has a non-numeric major revision")]
    BadMajor(String),
}

#[derive(Debug, Error)]
pub enum DeviceListError {
    #[error("Could not load device list because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Device list failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Device list row {0} does not have the expected device_type,comm_path,target_revision columns")]
    BadRowFormat(usize),
    #[error("Device list row {row} failed due to revision error: {source}")]
    BadRevision {
        row: usize,
        #[source]
        source: RevisionError,
    },
    #[error("Device list contains no devices")]
    NoDevices,
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Run context failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Run context failed to format the run timestamp: {0}")]
    FormatError(#[from] time::error::Format),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Audit sink failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Audit sink failed due to logger error: {0}")]
    LoggerError(#[from] spdlog::Error),
}

#[derive(Debug, Error)]
pub enum FlashToolError {
    #[error("Flash tool failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Flash tool subprocess did not expose a {0} pipe")]
    MissingPipe(&'static str),
}

#[derive(Debug, Error)]
pub enum ProjectServiceError {
    #[error("Project service failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Project service operation {op} exited with code {code:?}: {detail}")]
    OperationFailed {
        op: &'static str,
        code: Option<i32>,
        detail: String,
    },
    #[error("Project service reported an unrecognized operating mode: {0:?}")]
    BadMode(String),
}

#[derive(Debug, Error)]
pub enum RetentionError {
    #[error("Retention failed because directory {0:?} does not exist")]
    BadDirectory(PathBuf),
    #[error("Retention requires an extension with a leading separator, got {0:?}")]
    BadExtension(String),
    #[error("Retention failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Provisioning failed due to project service error: {0}")]
    ServiceError(#[from] ProjectServiceError),
    #[error("Provisioning failed due to flash tool error: {0}")]
    FlashError(#[from] FlashToolError),
    #[error("Flash tool exited with failure code {0:?} at stage {1}")]
    FlashExit(Option<i32>, ProvisionStage),
    #[error("Provisioning failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<BatchStatus>),
}
