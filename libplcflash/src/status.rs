/// Progress message emitted by the provisioning worker after each device,
/// consumed by whatever front end is driving the batch (the CLI feeds these
/// into its progress bar).
#[derive(Debug, Clone, Default)]
pub struct BatchStatus {
    pub progress: f32,
    pub device_index: usize,
    pub total_devices: usize,
}

impl BatchStatus {
    pub fn new(progress: f32, device_index: usize, total_devices: usize) -> Self {
        Self {
            progress,
            device_index,
            total_devices,
        }
    }
}
