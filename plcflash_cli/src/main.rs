//! # plcflash_cli
//!
//! Command-line front end for the plcflash batch firmware provisioner.
//!
//! ## Use
//!
//! Generate a template configuration (and a template device list next to
//! it):
//!
//! ```bash
//! plcflash_cli -p config.yml new
//! ```
//!
//! Fill out the paths, then run the batch:
//!
//! ```bash
//! plcflash_cli -p config.yml
//! ```
//!
//! The process exits with 0 only when every device in the batch was
//! provisioned successfully.

use clap::{Arg, Command};
use indicatif::{MultiProgress, ProgressBar};
use indicatif_log_bridge::LogWrapper;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Sender};

use libplcflash::artifact::RunContext;
use libplcflash::config::Config;
use libplcflash::device::DeviceDescriptor;
use libplcflash::device_list::{load_device_list, template_device_list};
use libplcflash::error::ProvisionError;
use libplcflash::flash_tool::FlashTool;
use libplcflash::project_service::BridgeService;
use libplcflash::provision::{summarize, DeviceReport, ProvisionOutcome, Provisioner};
use libplcflash::retention::enforce_retention;
use libplcflash::sink::AuditSink;
use libplcflash::status::BatchStatus;

fn make_templates(path: &Path) {
    let config = Config::default();
    let yaml_str = serde_yaml::to_string(&config).unwrap();
    let mut file = File::create(path).expect("Could not create template config file!");
    file.write_all(yaml_str.as_bytes())
        .expect("Failed to write yaml data to file!");

    let list_path = path.with_file_name("device_list.csv");
    let mut list_file =
        File::create(&list_path).expect("Could not create template device list file!");
    list_file
        .write_all(template_device_list().as_bytes())
        .expect("Failed to write device list template to file!");
}

/// Provisioning worker, run on its own thread while the main thread drives
/// the progress bar.
fn run_provisioning(
    config: Config,
    sink: AuditSink,
    ctx: RunContext,
    devices: Vec<DeviceDescriptor>,
    tx: Sender<BatchStatus>,
) -> Result<Vec<DeviceReport>, ProvisionError> {
    let service = BridgeService::new(&config.bridge_tool_path);
    let flash = FlashTool::new(&config.flash_tool_path);
    let provisioner = Provisioner::new(&service, &flash, &sink, &ctx, &config.policy);
    provisioner.provision_batch(&devices, &tx)
}

fn write_summary(sink: &AuditSink, reports: &[DeviceReport]) -> bool {
    for report in reports {
        match report.outcome() {
            ProvisionOutcome::Success => sink.line(&format!(
                "PASS {} ({})",
                report.device.comm_path, report.device.device_type
            )),
            ProvisionOutcome::Failure { stage, cause } => sink.error(&format!(
                "FAIL {} ({}) at {}: {}",
                report.device.comm_path, report.device.device_type, stage, cause
            )),
        }
    }

    let summary = summarize(reports);
    sink.line(&format!(
        "{} device(s) succeeded, {} failed",
        summary.succeeded, summary.failed
    ));
    if summary.all_succeeded() {
        sink.line("==== PROVISIONING PASSED ====");
    } else {
        sink.error("==== PROVISIONING FAILED ====");
    }
    summary.all_succeeded()
}

fn main() {
    // Create a cli
    let matches = Command::new("plcflash_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .help("Path to the configuration file"),
        )
        .get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    LogWrapper::new(pb_manager.clone(), logger)
        .try_init()
        .expect("Could not create logging/progress!");

    // Parse the cli
    let config_path = PathBuf::from(matches.get_one::<String>("path").expect("We require args"));

    if let Some(("new", _)) = matches.subcommand() {
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );

        make_templates(&config_path);
        log::info!("Done.");
        return;
    }

    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    log::info!("Config successfully loaded.");
    log::info!(
        "Device List: {}",
        config.device_list_path.to_string_lossy()
    );
    log::info!("Artifact Path: {}", config.artifact_path.to_string_lossy());
    log::info!("Report Path: {}", config.report_path.to_string_lossy());
    log::info!("Flash Tool: {}", config.flash_tool_path.to_string_lossy());
    log::info!("SDK Bridge: {}", config.bridge_tool_path.to_string_lossy());
    log::info!(
        "Retention: {} artifact(s), {} report(s)",
        config.retain_artifacts,
        config.retain_reports
    );

    let ctx = match RunContext::new(&config.artifact_path, &config.project_extension) {
        Ok(ctx) => ctx,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    let sink = match AuditSink::new(&config.report_path, ctx.stamp()) {
        Ok(sink) => sink,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    let devices = match load_device_list(&config.device_list_path) {
        Ok(devices) => devices,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    sink.line(&format!(
        "plcflash run {}: {} device(s) to provision",
        ctx.stamp(),
        devices.len()
    ));

    // Setup the progress bar
    let pb = pb_manager.add(ProgressBar::new(100));
    let (tx, rx) = channel();
    // Spawn the task!
    let worker_sink = sink.clone();
    let worker_config = config.clone();
    let worker_ctx = ctx.clone();
    let handle =
        std::thread::spawn(move || run_provisioning(worker_config, worker_sink, worker_ctx, devices, tx));

    // The receiver ends when the worker drops its sender
    for status in rx {
        pb.set_position((status.progress * 100.0) as u64);
        pb.set_message(format!(
            "device {}/{}",
            status.device_index, status.total_devices
        ));
    }
    pb.finish();

    let mut all_ok = false;
    match handle.join() {
        Ok(result) => match result {
            Ok(reports) => {
                all_ok = write_summary(&sink, &reports);
            }
            Err(e) => log::error!("Provisioning failed with error: {e}"),
        },
        Err(_) => log::error!("Failed to join provisioning task!"),
    }

    // Keep only the most recent artifacts and reports; retention problems
    // are logged but never change the run result
    if let Err(e) = enforce_retention(
        &config.artifact_path,
        &config.artifact_extension(),
        config.retain_artifacts,
        &sink,
    ) {
        log::error!("{e}");
    }
    if let Err(e) = enforce_retention(
        &config.report_path,
        &config.report_extension(),
        config.retain_reports,
        &sink,
    ) {
        log::error!("{e}");
    }

    sink.close();
    log::info!("Done.");
    std::process::exit(if all_ok { 0 } else { 1 });
}
