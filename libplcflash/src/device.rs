use std::fmt::{Display, Formatter};
use std::str::FromStr;

use super::error::RevisionError;

/// Catalog identifiers that require the full project upload/convert/download
/// cycle and operating-mode transitions around a firmware flash. Anything not
/// in this list is flashed as a plain peripheral.
pub const CONTROLLER_TYPES: [&str; 10] = [
    "1756-L81E",
    "1756-L82E",
    "1756-L83E",
    "1756-L84E",
    "1756-L85E",
    "1756-L8SP",
    "5069-L306ER",
    "5069-L320ER",
    "5069-L340ERM",
    "Emulate 5570",
];

/// A firmware revision in the `major.minor` form used by the flash tool.
///
/// The major part must be numeric since it drives project conversion; the
/// minor part is carried verbatim (leading zeros matter to the tool).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub major: u16,
    pub minor: String,
}

impl FromStr for Revision {
    type Err = RevisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major_str, minor) = s
            .split_once('.')
            .ok_or_else(|| RevisionError::MissingSeparator(s.to_string()))?;
        let major = major_str
            .parse::<u16>()
            .map_err(|_| RevisionError::BadMajor(s.to_string()))?;
        Ok(Self {
            major,
            minor: minor.to_string(),
        })
    }
}

impl Display for Revision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// One row of the device list. Immutable once ingested; the orchestrator
/// reads it through a single provisioning sequence and discards it.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    pub device_type: String,
    pub comm_path: String,
    pub target_revision: Revision,
}

impl DeviceDescriptor {
    /// Whether this device is controller-class. Pure allow-list match.
    pub fn is_controller(&self) -> bool {
        CONTROLLER_TYPES.contains(&self.device_type.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revision_parse() {
        let rev = "33.011".parse::<Revision>().unwrap();
        assert_eq!(rev.major, 33);
        assert_eq!(rev.minor, "011");
        assert_eq!(rev.to_string(), "33.011");
    }

    #[test]
    fn test_revision_rejects_missing_separator() {
        assert!(matches!(
            "33".parse::<Revision>(),
            Err(RevisionError::MissingSeparator(_))
        ));
    }

    #[test]
    fn test_revision_rejects_bad_major() {
        assert!(matches!(
            "v33.011".parse::<Revision>(),
            Err(RevisionError::BadMajor(_))
        ));
    }

    #[test]
    fn test_classification() {
        let controller = DeviceDescriptor {
            device_type: String::from("1756-L85E"),
            comm_path: String::from("AB_ETH-1!192.168.1.10"),
            target_revision: "33.011".parse().unwrap(),
        };
        let peripheral = DeviceDescriptor {
            device_type: String::from("1734-AENTR"),
            comm_path: String::from("AB_ETH-1!192.168.1.11"),
            target_revision: "5.011".parse().unwrap(),
        };
        assert!(controller.is_controller());
        assert!(!peripheral.is_controller());
    }
}
