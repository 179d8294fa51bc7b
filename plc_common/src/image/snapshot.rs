//! Point-in-time copies of the process image.

use serde::{Deserialize, Serialize};

use super::bank::Bank;

/// Engine-owned projections computed every scan.
///
/// Mutated only by the rung-evaluation step; everybody else sees copies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerState {
    /// Motor latch.
    pub motor_running: bool,
    /// Pump latch.
    pub pump_running: bool,
}

/// Copy of all four banks plus the controller state.
///
/// Taken under every bank lock, so it never mixes pre- and post-tick values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSnapshot {
    /// Discrete inputs.
    pub binary_inputs: Vec<bool>,
    /// Coils.
    pub binary_outputs: Vec<bool>,
    /// Input registers.
    pub integer_inputs: Vec<u16>,
    /// Holding registers.
    pub integer_outputs: Vec<u16>,
    /// Derived controller state.
    pub controller: ControllerState,
}

impl ImageSnapshot {
    /// Length of one bank in this snapshot.
    pub fn len(&self, bank: Bank) -> usize {
        match bank {
            Bank::BinaryInputs => self.binary_inputs.len(),
            Bank::BinaryOutputs => self.binary_outputs.len(),
            Bank::IntegerInputs => self.integer_inputs.len(),
            Bank::IntegerOutputs => self.integer_outputs.len(),
        }
    }

    /// Truncate every bank to its first `window` addresses.
    pub fn window(&self, window: usize) -> ImageSnapshot {
        fn head<T: Copy>(values: &[T], n: usize) -> Vec<T> {
            values[..n.min(values.len())].to_vec()
        }
        ImageSnapshot {
            binary_inputs: head(&self.binary_inputs, window),
            binary_outputs: head(&self.binary_outputs, window),
            integer_inputs: head(&self.integer_inputs, window),
            integer_outputs: head(&self.integer_outputs, window),
            controller: self.controller,
        }
    }
}
