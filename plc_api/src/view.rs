//! Client-facing projection of the process image.

use std::time::Duration;

use plc_common::image::ImageSnapshot;
use serde::{Deserialize, Serialize};

/// Leading window of every bank, plus controller state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlcStateView {
    pub coils: Vec<bool>,
    pub discrete_inputs: Vec<bool>,
    pub holding_registers: Vec<u16>,
    pub input_registers: Vec<u16>,
    pub motor_running: bool,
    pub pump_running: bool,
    /// Configured scan period in seconds.
    pub scan_time: f64,
}

impl PlcStateView {
    /// Project a snapshot onto its first `window` addresses.
    pub fn from_snapshot(snapshot: &ImageSnapshot, window: usize, scan_period: Duration) -> Self {
        let w = snapshot.window(window);
        Self {
            coils: w.binary_outputs,
            discrete_inputs: w.binary_inputs,
            holding_registers: w.integer_outputs,
            input_registers: w.integer_inputs,
            motor_running: w.controller.motor_running,
            pump_running: w.controller.pump_running,
            scan_time: scan_period.as_secs_f64(),
        }
    }
}
