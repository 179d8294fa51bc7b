//! Fixed rung set.
//!
//! Evaluation is split into a pure step ([`evaluate`]) and the I/O around it
//! ([`RungInputs::read`], [`RungOutputs::write`]) so the logic can be tested
//! without a process image.
//!
//! - [`latched`]: motor, pump and heater. Each holds its prior value when no
//!   trigger fires.
//! - [`stateless`]: alarm mask, rebuilt from scratch every scan.

pub mod latched;
pub mod stateless;

use plc_common::image::{ControllerState, ImageGuard, MemoryError};
use plc_common::io::IoRole;

pub use stateless::AlarmMask;

/// Rung inputs sampled at the start of a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RungInputs {
    /// DI0.
    pub start: bool,
    /// DI1.
    pub stop: bool,
    /// DI2.
    pub motor_fault: bool,
    /// DI3.
    pub tank_level_low: bool,
    /// HR0.
    pub temperature: u16,
    /// HR1.
    pub pressure: u16,
    /// HR4.
    pub setpoint: u16,
    /// Coil 2 as left by the previous scan (heater latch).
    pub heater_on: bool,
}

impl RungInputs {
    /// Sample every rung input through a held image guard.
    pub fn read(guard: &mut ImageGuard<'_>) -> Result<Self, MemoryError> {
        Ok(Self {
            start: guard.bit(IoRole::StartButton)?,
            stop: guard.bit(IoRole::StopButton)?,
            motor_fault: guard.bit(IoRole::MotorFault)?,
            tank_level_low: guard.bit(IoRole::TankLevelLow)?,
            temperature: guard.word(IoRole::Temperature)?,
            pressure: guard.word(IoRole::Pressure)?,
            setpoint: guard.word(IoRole::TemperatureSetpoint)?,
            heater_on: guard.bit(IoRole::HeaterCoil)?,
        })
    }
}

/// Result of one rung pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RungOutputs {
    /// Next motor/pump latches.
    pub controller: ControllerState,
    /// Next heater latch.
    pub heater_on: bool,
    /// Alarm mask for this scan.
    pub alarms: AlarmMask,
}

impl RungOutputs {
    /// Drive coils 0..=3, HR3 and the controller state.
    pub fn write(&self, guard: &mut ImageGuard<'_>) -> Result<(), MemoryError> {
        guard.set_bit(IoRole::MotorCoil, self.controller.motor_running)?;
        guard.set_bit(IoRole::PumpCoil, self.controller.pump_running)?;
        guard.set_bit(IoRole::HeaterCoil, self.heater_on)?;
        guard.set_bit(IoRole::AlarmIndicator, !self.alarms.is_empty())?;
        guard.set_word(IoRole::AlarmStatus, self.alarms.bits())?;
        guard.set_controller(self.controller);
        Ok(())
    }
}

/// Evaluate all rungs against `inputs` and the prior controller state.
pub fn evaluate(inputs: &RungInputs, prior: ControllerState) -> RungOutputs {
    let motor_running = latched::motor(
        prior.motor_running,
        inputs.start,
        inputs.stop,
        inputs.motor_fault,
    );
    // Pump sees the motor value computed on this scan.
    let pump_running = latched::pump(prior.pump_running, motor_running, inputs.tank_level_low);
    let heater_on = latched::heater(inputs.heater_on, inputs.temperature, inputs.setpoint);
    let alarms = stateless::alarm_mask(inputs.temperature, inputs.pressure, inputs.motor_fault);

    RungOutputs {
        controller: ControllerState {
            motor_running,
            pump_running,
        },
        heater_on,
        alarms,
    }
}
