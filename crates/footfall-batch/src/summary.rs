//! Result types for one batch run (spec.md §4.6 step 4: "a summary").

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct DeviceBatchResult {
    pub device_id: String,
    pub success: bool,
    pub total_steps: i64,
    pub record_count: usize,
    pub tx_handle: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct BatchSummary {
    pub devices: Vec<DeviceBatchResult>,
}

impl BatchSummary {
    pub fn success_count(&self) -> usize {
        self.devices.iter().filter(|d| d.success).count()
    }

    pub fn failure_count(&self) -> usize {
        self.devices.iter().filter(|d| !d.success).count()
    }
}
