use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// The steps of the controller-class provisioning sequence. Peripherals only
/// ever see [`ProvisionStage::Flash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStage {
    Upload,
    ModeChangePre,
    Flash,
    Convert,
    Download,
    ModeChangePost,
}

impl Display for ProvisionStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProvisionStage::Upload => "upload",
            ProvisionStage::ModeChangePre => "pre-flash mode change",
            ProvisionStage::Flash => "flash",
            ProvisionStage::Convert => "convert",
            ProvisionStage::Download => "download",
            ProvisionStage::ModeChangePost => "post-flash mode change",
        };
        write!(f, "{}", name)
    }
}

/// What the orchestrator does when a step fails.
///
/// `Retry(n)` re-runs the failing step up to `n` more times; if the step
/// still fails the device is aborted (a device in a half-provisioned state
/// is worse than one that was skipped outright).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureAction {
    AbortDevice,
    SkipStep,
    Retry(u32),
}

/// Per-step failure severity, overridable from the configuration file.
///
/// The defaults reproduce the flashing workflow this tool replaces: an
/// upload, convert, download, or post-flash mode failure is logged and the
/// sequence falls through to the next step with whatever state is available,
/// while a pre-flash mode failure aborts the device. A flash failure also
/// aborts the device; the tool's exit code is observed here, so continuing
/// to convert and download after a failed flash would only compound damage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailurePolicy {
    pub upload: FailureAction,
    pub mode_change_pre: FailureAction,
    pub flash: FailureAction,
    pub convert: FailureAction,
    pub download: FailureAction,
    pub mode_change_post: FailureAction,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            upload: FailureAction::SkipStep,
            mode_change_pre: FailureAction::AbortDevice,
            flash: FailureAction::AbortDevice,
            convert: FailureAction::SkipStep,
            download: FailureAction::SkipStep,
            mode_change_post: FailureAction::SkipStep,
        }
    }
}

impl FailurePolicy {
    pub fn action(&self, stage: ProvisionStage) -> FailureAction {
        match stage {
            ProvisionStage::Upload => self.upload,
            ProvisionStage::ModeChangePre => self.mode_change_pre,
            ProvisionStage::Flash => self.flash,
            ProvisionStage::Convert => self.convert,
            ProvisionStage::Download => self.download,
            ProvisionStage::ModeChangePost => self.mode_change_post,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let policy = FailurePolicy::default();
        assert_eq!(policy.action(ProvisionStage::Upload), FailureAction::SkipStep);
        assert_eq!(
            policy.action(ProvisionStage::ModeChangePre),
            FailureAction::AbortDevice
        );
        assert_eq!(policy.action(ProvisionStage::Flash), FailureAction::AbortDevice);
        assert_eq!(
            policy.action(ProvisionStage::ModeChangePost),
            FailureAction::SkipStep
        );
    }

    #[test]
    fn test_partial_override_from_yaml() {
        let policy: FailurePolicy = serde_yaml::from_str("upload: abort-device\n").unwrap();
        assert_eq!(policy.upload, FailureAction::AbortDevice);
        // untouched fields keep their defaults
        assert_eq!(policy.convert, FailureAction::SkipStep);
    }

    #[test]
    fn test_retry_from_yaml() {
        let policy: FailurePolicy = serde_yaml::from_str("flash: !retry 2\n").unwrap();
        assert_eq!(policy.flash, FailureAction::Retry(2));
    }
}
