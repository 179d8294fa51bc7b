//! Physical process approximation.
//!
//! Integer first-order model of a heated, pumped tank. Every scan moves each
//! process variable one step towards its bound depending on the actuator
//! state, then mirrors the result into the sensor input registers.

use plc_common::consts::{
    COOLING_RATE, FLOW_DECAY_RATE, FLOW_MAX, FLOW_PRESSURE_THRESHOLD, FLOW_RISE_RATE,
    HEATING_RATE, INITIAL_TEMPERATURE, INITIAL_TEMPERATURE_SETPOINT, PRESSURE_DECAY_RATE,
    PRESSURE_MAX, PRESSURE_RISE_RATE, TEMPERATURE_MAX, TEMPERATURE_MIN,
};
use plc_common::image::{Bank, ImageGuard, MemoryError, ProcessImage};
use plc_common::io::IoRole;

/// Temperature, pressure and flow as stored in HR0..=2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessVariables {
    pub temperature: u16,
    pub pressure: u16,
    pub flow: u16,
}

impl ProcessVariables {
    /// Read HR0..=2 through a held guard.
    pub fn read(guard: &mut ImageGuard<'_>) -> Result<Self, MemoryError> {
        Ok(Self {
            temperature: guard.word(IoRole::Temperature)?,
            pressure: guard.word(IoRole::Pressure)?,
            flow: guard.word(IoRole::Flow)?,
        })
    }

    /// Advance one scan.
    ///
    /// Flow reacts to the pressure from before this step.
    pub fn step(self, heater_on: bool, pump_running: bool) -> Self {
        let temperature = if heater_on {
            self.temperature.saturating_add(HEATING_RATE).min(TEMPERATURE_MAX)
        } else {
            self.temperature.saturating_sub(COOLING_RATE).max(TEMPERATURE_MIN)
        };

        let pressure = if pump_running {
            self.pressure.saturating_add(PRESSURE_RISE_RATE).min(PRESSURE_MAX)
        } else {
            self.pressure.saturating_sub(PRESSURE_DECAY_RATE)
        };

        let flow = if pump_running && self.pressure > FLOW_PRESSURE_THRESHOLD {
            self.flow.saturating_add(FLOW_RISE_RATE).min(FLOW_MAX)
        } else {
            self.flow.saturating_sub(FLOW_DECAY_RATE)
        };

        Self {
            temperature,
            pressure,
            flow,
        }
    }

    /// Store HR0..=2 and mirror them into IR0..=2.
    pub fn write(&self, guard: &mut ImageGuard<'_>) -> Result<(), MemoryError> {
        guard.set_word(IoRole::Temperature, self.temperature)?;
        guard.set_word(IoRole::Pressure, self.pressure)?;
        guard.set_word(IoRole::Flow, self.flow)?;
        guard.set_word(IoRole::TemperatureSensor, self.temperature)?;
        guard.set_word(IoRole::PressureSensor, self.pressure)?;
        guard.set_word(IoRole::FlowSensor, self.flow)?;
        Ok(())
    }
}

/// Write the initial process conditions into a fresh image.
///
/// Temperature and setpoint start at 800; pressure, flow and the alarm
/// status start at zero.
pub fn seed_initial_conditions(image: &ProcessImage) -> Result<(), MemoryError> {
    let hr = Bank::IntegerOutputs;
    image.write_word(hr, IoRole::Temperature.address(), i64::from(INITIAL_TEMPERATURE))?;
    image.write_word(hr, IoRole::Pressure.address(), 0)?;
    image.write_word(hr, IoRole::Flow.address(), 0)?;
    image.write_word(hr, IoRole::AlarmStatus.address(), 0)?;
    image.write_word(
        hr,
        IoRole::TemperatureSetpoint.address(),
        i64::from(INITIAL_TEMPERATURE_SETPOINT),
    )?;
    Ok(())
}
