//! Scan cycle body and timing statistics.
//!
//! One cycle holds every bank lock from the first input sample to the last
//! sensor mirror write, so no reader can observe a partial tick.

use std::time::Duration;

use plc_common::image::ProcessImage;

use crate::error::ScanError;
use crate::process::ProcessVariables;
use crate::rungs::{self, RungInputs, RungOutputs};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    /// Completed cycles (faulted ones included).
    pub cycle_count: u64,
    /// Last cycle duration.
    pub last_cycle: Duration,
    /// Shortest cycle, `Duration::MAX` until the first cycle.
    pub min_cycle: Duration,
    /// Longest cycle.
    pub max_cycle: Duration,
    /// Running sum for the average.
    pub total_cycle: Duration,
    /// Cycles that took longer than the configured period.
    pub timing_violations: u64,
    /// Cycles whose body returned an error or panicked.
    pub faulted_cycles: u64,
}

impl CycleStats {
    /// Zeroed stats.
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle: Duration::ZERO,
            min_cycle: Duration::MAX,
            max_cycle: Duration::ZERO,
            total_cycle: Duration::ZERO,
            timing_violations: 0,
            faulted_cycles: 0,
        }
    }

    /// Record one cycle.
    #[inline]
    pub fn record(&mut self, duration: Duration) {
        self.cycle_count += 1;
        self.last_cycle = duration;
        if duration < self.min_cycle {
            self.min_cycle = duration;
        }
        if duration > self.max_cycle {
            self.max_cycle = duration;
        }
        self.total_cycle = self.total_cycle.saturating_add(duration);
    }

    /// Count a cycle that overran the period.
    #[inline]
    pub fn record_violation(&mut self) {
        self.timing_violations += 1;
    }

    /// Count a faulted cycle.
    #[inline]
    pub fn record_fault(&mut self) {
        self.faulted_cycles += 1;
    }

    /// Average cycle time (zero if no cycles).
    pub fn avg_cycle(&self) -> Duration {
        if self.cycle_count == 0 {
            Duration::ZERO
        } else {
            let avg_ns = self.total_cycle.as_nanos() / u128::from(self.cycle_count);
            Duration::from_nanos(u64::try_from(avg_ns).unwrap_or(u64::MAX))
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Cycle Body ─────────────────────────────────────────────────────

/// What one cycle computed. Useful for tests and tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    /// Rung pass result.
    pub rungs: RungOutputs,
    /// Process variables after the process pass.
    pub process: ProcessVariables,
}

/// Run one scan cycle against `image`.
///
/// 1. Sample inputs and evaluate rungs.
/// 2. Step the process model with the new actuator state.
/// 3. Mirror process variables into the sensor registers.
pub fn execute_scan(image: &ProcessImage) -> Result<ScanReport, ScanError> {
    let mut guard = image.lock_all();

    let inputs = RungInputs::read(&mut guard)?;
    let rungs = rungs::evaluate(&inputs, guard.controller());
    rungs.write(&mut guard)?;

    let process = ProcessVariables::read(&mut guard)?
        .step(rungs.heater_on, rungs.controller.pump_running);
    process.write(&mut guard)?;

    Ok(ScanReport { rungs, process })
}
