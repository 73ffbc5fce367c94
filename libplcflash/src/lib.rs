//! # plcflash
//!
//! plcflash is a batch firmware-provisioning tool for Logix-class control
//! hardware, written in Rust. Given an ordered device list it verifies and
//! flashes firmware on each device in sequence, wrapping controller-class
//! devices in the full project upload / convert / download cycle with the
//! required operating-mode transitions, and leaves a durable per-run audit
//! report behind.
//!
//! ## Workflow
//!
//! Devices are provisioned strictly one at a time, in the order they appear
//! in the device list. For every device the orchestrator decides between two
//! sequences:
//!
//! - **Controller-class** (catalog number on a fixed allow-list):
//!   1. Upload the project currently on the device to a run-stamped local
//!      artifact.
//!   2. Query the operating mode; request Program mode if needed.
//!   3. Invoke the external firmware-flash tool, streaming its output to
//!      the audit report.
//!   4. Convert the uploaded project to the target major revision.
//!   5. Reassert Program mode, then download the converted project.
//!   6. Return the controller to Run mode.
//! - **Peripheral** (everything else): step 3 only.
//!
//! A failed step never aborts the whole batch. What it does to the rest of
//! that device's sequence is governed by a per-step failure policy
//! (abort-device, skip-step, or retry-N) that can be overridden from the
//! configuration file; the defaults abort a device on pre-flash mode
//! failures and on a failed flash, and fall through on everything else.
//!
//! The vendor SDK is an opaque collaborator reached through a bridge
//! executable (one invocation per operation), and the flash tool is a plain
//! subprocess taking the communication path and target revision as
//! positional arguments. Neither is given a timeout: a hung tool blocks the
//! batch, which is a deliberate, documented limitation.
//!
//! ## Device list format
//!
//! A CSV file with a header line and one row per device:
//!
//! ```csv
//! device_type,comm_path,target_revision
//! 1756-L85E,AB_ETH-1!192.168.1.10,33.011
//! 1734-AENTR,AB_ETH-1!192.168.1.11,5.016
//! ```
//!
//! The revision must be of the `major.minor` form; rows with an unparseable
//! revision reject the whole list before anything touches a device.
//!
//! ## Configuration
//!
//! Configuration is a YAML file (a template can be generated with the CLI's
//! `new` subcommand):
//!
//! ```yml
//! device_list_path: None
//! artifact_path: None
//! report_path: None
//! flash_tool_path: None
//! bridge_tool_path: None
//! project_extension: ACD
//! retain_artifacts: 5
//! retain_reports: 10
//! policy:
//!   upload: skip-step
//!   mode_change_pre: abort-device
//!   flash: abort-device
//!   convert: skip-step
//!   download: skip-step
//!   mode_change_post: skip-step
//! ```
//!
//! ## Output
//!
//! Every run writes uploaded and converted project artifacts named
//! `{run_stamp}_{sanitized_comm_path}[_v{major}].{ext}` into the artifact
//! directory, and a `{run_stamp}_provision_report.txt` audit report that
//! mirrors everything printed to the console, including the flash tool's
//! own output. After the batch, a retention pass keeps only the most recent
//! K artifacts and reports (configurable per directory) and deletes the
//! rest.
pub mod artifact;
pub mod config;
pub mod device;
pub mod device_list;
pub mod error;
pub mod flash_tool;
pub mod policy;
pub mod project_service;
pub mod provision;
pub mod retention;
pub mod sink;
pub mod status;
