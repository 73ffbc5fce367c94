use std::sync::mpsc::Sender;

use super::artifact::RunContext;
use super::device::DeviceDescriptor;
use super::error::ProvisionError;
use super::flash_tool::FlashTool;
use super::policy::{FailureAction, FailurePolicy, ProvisionStage};
use super::project_service::{OperatingMode, ProjectService};
use super::sink::AuditSink;
use super::status::BatchStatus;

/// One recorded step failure. Steps running under a skip-step policy can
/// fail without ending the device sequence, so a report may hold several.
#[derive(Debug, Clone)]
pub struct StepFailure {
    pub stage: ProvisionStage,
    pub cause: String,
}

/// Final per-device result, derived from the recorded failures so the
/// summary never has to be reconstructed from log lines.
#[derive(Debug, Clone)]
pub enum ProvisionOutcome {
    Success,
    Failure { stage: ProvisionStage, cause: String },
}

/// Everything that happened to one device during the run.
#[derive(Debug, Clone)]
pub struct DeviceReport {
    pub device: DeviceDescriptor,
    pub failures: Vec<StepFailure>,
    pub aborted_at: Option<ProvisionStage>,
}

impl DeviceReport {
    fn new(device: DeviceDescriptor) -> Self {
        Self {
            device,
            failures: Vec::new(),
            aborted_at: None,
        }
    }

    /// The device outcome. The first failing stage wins; later skip-step
    /// failures are still listed in `failures`.
    pub fn outcome(&self) -> ProvisionOutcome {
        match self.failures.first() {
            None => ProvisionOutcome::Success,
            Some(failure) => ProvisionOutcome::Failure {
                stage: failure.stage,
                cause: failure.cause.clone(),
            },
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Batch totals for the final banner and the process exit code.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

pub fn summarize(reports: &[DeviceReport]) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for report in reports {
        if report.succeeded() {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
        }
    }
    summary
}

enum StepFlow {
    Continue,
    Abort,
}

/// Runs the fixed per-device provisioning sequence over an ordered device
/// batch, strictly one device and one vendor operation at a time.
///
/// Controller-class devices go through upload, mode change, flash, convert,
/// download, and back to Run mode; peripherals are only flashed. A device
/// failure never aborts the batch: how much of a device's sequence survives
/// a failed step is decided by the [`FailurePolicy`].
pub struct Provisioner<'a> {
    service: &'a dyn ProjectService,
    flash: &'a FlashTool,
    sink: &'a AuditSink,
    ctx: &'a RunContext,
    policy: &'a FailurePolicy,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        service: &'a dyn ProjectService,
        flash: &'a FlashTool,
        sink: &'a AuditSink,
        ctx: &'a RunContext,
        policy: &'a FailurePolicy,
    ) -> Self {
        Self {
            service,
            flash,
            sink,
            ctx,
            policy,
        }
    }

    /// Provision every device in input order, emitting a status message
    /// after each one. Returns one report per device.
    pub fn provision_batch(
        &self,
        devices: &[DeviceDescriptor],
        tx: &Sender<BatchStatus>,
    ) -> Result<Vec<DeviceReport>, ProvisionError> {
        let total = devices.len();
        let mut reports: Vec<DeviceReport> = Vec::with_capacity(total);
        tx.send(BatchStatus::new(0.0, 0, total))?;

        for (index, device) in devices.iter().enumerate() {
            self.sink.line(&format!(
                "---- Device {}/{}: {} at {} -> revision {} ----",
                index + 1,
                total,
                device.device_type,
                device.comm_path,
                device.target_revision
            ));

            let report = if device.is_controller() {
                self.provision_controller(device)
            } else {
                self.provision_peripheral(device)
            };

            match report.outcome() {
                ProvisionOutcome::Success => self
                    .sink
                    .line(&format!("{} provisioned successfully", device.comm_path)),
                ProvisionOutcome::Failure { stage, cause } => self.sink.error(&format!(
                    "{} failed at {}: {}",
                    device.comm_path, stage, cause
                )),
            }

            reports.push(report);
            tx.send(BatchStatus::new(
                (index + 1) as f32 / total as f32,
                index + 1,
                total,
            ))?;
        }

        Ok(reports)
    }

    fn provision_peripheral(&self, device: &DeviceDescriptor) -> DeviceReport {
        let mut report = DeviceReport::new(device.clone());
        self.run_step(ProvisionStage::Flash, &mut report, || {
            self.flash_device(device)
        });
        report
    }

    fn provision_controller(&self, device: &DeviceDescriptor) -> DeviceReport {
        let mut report = DeviceReport::new(device.clone());
        let upload_path = self.ctx.upload_artifact(&device.comm_path);
        let converted_path = self
            .ctx
            .converted_artifact(&device.comm_path, device.target_revision.major);
        let comm_path = device.comm_path.as_str();

        self.sink.line(&format!(
            "Uploading project from {} to {}",
            comm_path,
            upload_path.to_string_lossy()
        ));
        if let StepFlow::Abort = self.run_step(ProvisionStage::Upload, &mut report, || {
            Ok(self.service.upload_project(comm_path, &upload_path)?)
        }) {
            return report;
        }

        if let StepFlow::Abort = self.run_step(ProvisionStage::ModeChangePre, &mut report, || {
            self.ensure_program_mode(comm_path)
        }) {
            return report;
        }

        if let StepFlow::Abort = self.run_step(ProvisionStage::Flash, &mut report, || {
            self.flash_device(device)
        }) {
            return report;
        }

        self.sink.line(&format!(
            "Converting {} to major revision {}",
            upload_path.to_string_lossy(),
            device.target_revision.major
        ));
        if let StepFlow::Abort = self.run_step(ProvisionStage::Convert, &mut report, || {
            Ok(self.service.convert_project(
                &upload_path,
                &converted_path,
                device.target_revision.major,
            )?)
        }) {
            return report;
        }

        self.sink.line(&format!(
            "Downloading {} to {}",
            converted_path.to_string_lossy(),
            comm_path
        ));
        if let StepFlow::Abort = self.run_step(ProvisionStage::Download, &mut report, || {
            // the Program-mode precondition is reasserted before every download
            self.ensure_program_mode(comm_path)?;
            Ok(self.service.download_project(comm_path, &converted_path)?)
        }) {
            return report;
        }

        self.sink
            .line(&format!("Returning {} to Run mode", comm_path));
        self.run_step(ProvisionStage::ModeChangePost, &mut report, || {
            Ok(self
                .service
                .set_operating_mode(comm_path, OperatingMode::Run)?)
        });

        report
    }

    fn flash_device(&self, device: &DeviceDescriptor) -> Result<(), ProvisionError> {
        self.sink.line(&format!(
            "Flashing {} to revision {}",
            device.comm_path, device.target_revision
        ));
        let output = self.flash.flash(
            &device.comm_path,
            &device.target_revision.to_string(),
            self.sink,
        )?;
        if output.success() {
            Ok(())
        } else {
            Err(ProvisionError::FlashExit(
                output.exit_code,
                ProvisionStage::Flash,
            ))
        }
    }

    fn ensure_program_mode(&self, comm_path: &str) -> Result<(), ProvisionError> {
        let mode = self.service.operating_mode(comm_path)?;
        if mode != OperatingMode::Program {
            self.sink.line(&format!(
                "{} is in {} mode, requesting Program mode",
                comm_path, mode
            ));
            self.service
                .set_operating_mode(comm_path, OperatingMode::Program)?;
        }
        Ok(())
    }

    /// Run one step under its configured failure action, recording any final
    /// failure in the report.
    fn run_step<F>(&self, stage: ProvisionStage, report: &mut DeviceReport, mut op: F) -> StepFlow
    where
        F: FnMut() -> Result<(), ProvisionError>,
    {
        let action = self.policy.action(stage);
        let mut attempts_left = match action {
            FailureAction::Retry(n) => n,
            _ => 0,
        };

        loop {
            let error = match op() {
                Ok(()) => return StepFlow::Continue,
                Err(e) => e,
            };
            if attempts_left > 0 {
                self.sink.error(&format!(
                    "{} failed for {}: {}; retrying ({} attempt(s) left)",
                    stage, report.device.comm_path, error, attempts_left
                ));
                attempts_left -= 1;
                continue;
            }

            report.failures.push(StepFailure {
                stage,
                cause: error.to_string(),
            });
            return match action {
                FailureAction::SkipStep => {
                    self.sink.error(&format!(
                        "{} failed for {}: {}; continuing with the remaining steps",
                        stage, report.device.comm_path, error
                    ));
                    StepFlow::Continue
                }
                FailureAction::AbortDevice | FailureAction::Retry(_) => {
                    self.sink.error(&format!(
                        "{} failed for {}: {}; aborting this device",
                        stage, report.device.comm_path, error
                    ));
                    report.aborted_at = Some(stage);
                    StepFlow::Abort
                }
            };
        }
    }
}
