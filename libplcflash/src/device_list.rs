use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::device::{DeviceDescriptor, Revision};
use super::error::DeviceListError;

const ENTRIES_PER_LINE: usize = 3; //Number of elements in a single row (type, path, revision)

/// Load the ordered device list from a CSV file.
///
/// The file has a single header line followed by one row per device with the
/// columns `device_type,comm_path,target_revision`. Row order is preserved;
/// devices are provisioned strictly in this order. Blank lines are skipped.
/// A malformed revision rejects the whole list so a device with an
/// unparseable target never reaches the orchestrator.
pub fn load_device_list(path: &Path) -> Result<Vec<DeviceDescriptor>, DeviceListError> {
    if !path.exists() {
        return Err(DeviceListError::BadFilePath(path.to_path_buf()));
    }
    let mut contents = String::new();
    File::open(path)?.read_to_string(&mut contents)?;
    parse_device_list(&contents)
}

fn parse_device_list(contents: &str) -> Result<Vec<DeviceDescriptor>, DeviceListError> {
    let mut devices: Vec<DeviceDescriptor> = Vec::new();

    let mut lines = contents.lines().enumerate();
    lines.next(); // Skip the header
    for (index, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let row = index + 1; // 1-based for messages
        let entries: Vec<&str> = line.split_terminator(',').map(str::trim).collect();
        if entries.len() < ENTRIES_PER_LINE {
            return Err(DeviceListError::BadRowFormat(row));
        }

        let target_revision = entries[2]
            .parse::<Revision>()
            .map_err(|source| DeviceListError::BadRevision { row, source })?;
        devices.push(DeviceDescriptor {
            device_type: entries[0].to_string(),
            comm_path: entries[1].to_string(),
            target_revision,
        });
    }

    if devices.is_empty() {
        return Err(DeviceListError::NoDevices);
    }
    Ok(devices)
}

/// Template device list written next to a template config by the CLI.
pub fn template_device_list() -> &'static str {
    "device_type,comm_path,target_revision\n\
     1756-L85E,AB_ETH-1!192.168.1.10,33.011\n\
     1734-AENTR,AB_ETH-1!192.168.1.11,5.016\n"
}
