use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::policy::FailurePolicy;

/// Structure representing the application configuration. Contains pathing,
/// retention, and failure-policy information.
/// Configs are serializable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub device_list_path: PathBuf,
    pub artifact_path: PathBuf,
    pub report_path: PathBuf,
    pub flash_tool_path: PathBuf,
    pub bridge_tool_path: PathBuf,
    pub project_extension: String,
    pub retain_artifacts: usize,
    pub retain_reports: usize,
    #[serde(default)]
    pub policy: FailurePolicy,
}

impl Default for Config {
    /// Generate a new Config object. Path fields will be empty/invalid
    fn default() -> Self {
        Self {
            device_list_path: PathBuf::from("None"),
            artifact_path: PathBuf::from("None"),
            report_path: PathBuf::from("None"),
            flash_tool_path: PathBuf::from("None"),
            bridge_tool_path: PathBuf::from("None"),
            project_extension: String::from("ACD"),
            retain_artifacts: 5,
            retain_reports: 10,
            policy: FailurePolicy::default(),
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Extension string for the report retention pass, with the leading
    /// separator the retention manager requires.
    pub fn report_extension(&self) -> String {
        String::from(".txt")
    }

    /// Extension string for the artifact retention pass.
    pub fn artifact_extension(&self) -> String {
        format!(".{}", self.project_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_file() {
        let result = Config::read_config_file(Path::new("/definitely/not/here.yml"));
        assert!(matches!(result, Err(ConfigError::BadFilePath(_))));
    }

    #[test]
    fn test_default_round_trip() {
        let config = Config::default();
        let yaml_str = serde_yaml::to_string(&config).unwrap();
        let back = serde_yaml::from_str::<Config>(&yaml_str).unwrap();
        assert_eq!(back.project_extension, "ACD");
        assert_eq!(back.retain_artifacts, 5);
        assert_eq!(back.policy, FailurePolicy::default());
    }

    #[test]
    fn test_extensions() {
        let config = Config::default();
        assert_eq!(config.artifact_extension(), ".ACD");
        assert_eq!(config.report_extension(), ".txt");
    }
}
