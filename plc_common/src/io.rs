//! I/O role map.
//!
//! `IoRole` names every point the fixed rung set touches and resolves it to
//! a `(bank, address)` pair. Rungs and the process model address memory by
//! role rather than by raw number.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::image::Bank;

/// Functional role of a memory point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IoRole {
    // ── Binary inputs ──
    /// Start push-button.
    StartButton,
    /// Stop push-button.
    StopButton,
    /// Motor fault contact.
    MotorFault,
    /// Tank level low switch.
    TankLevelLow,

    // ── Binary outputs ──
    /// Motor contactor.
    MotorCoil,
    /// Pump contactor.
    PumpCoil,
    /// Heater contactor.
    HeaterCoil,
    /// Alarm lamp.
    AlarmIndicator,

    // ── Integer outputs (process variables) ──
    /// Process temperature.
    Temperature,
    /// Process pressure.
    Pressure,
    /// Flow rate.
    Flow,
    /// Alarm status bitmask.
    AlarmStatus,
    /// Temperature setpoint.
    TemperatureSetpoint,

    // ── Integer inputs (sensor mirrors) ──
    /// Temperature sensor reading.
    TemperatureSensor,
    /// Pressure sensor reading.
    PressureSensor,
    /// Flow sensor reading.
    FlowSensor,
}

impl IoRole {
    /// Every role.
    pub const ALL: [IoRole; 16] = [
        IoRole::StartButton,
        IoRole::StopButton,
        IoRole::MotorFault,
        IoRole::TankLevelLow,
        IoRole::MotorCoil,
        IoRole::PumpCoil,
        IoRole::HeaterCoil,
        IoRole::AlarmIndicator,
        IoRole::Temperature,
        IoRole::Pressure,
        IoRole::Flow,
        IoRole::AlarmStatus,
        IoRole::TemperatureSetpoint,
        IoRole::TemperatureSensor,
        IoRole::PressureSensor,
        IoRole::FlowSensor,
    ];

    /// Bank holding this point.
    pub const fn bank(self) -> Bank {
        match self {
            Self::StartButton | Self::StopButton | Self::MotorFault | Self::TankLevelLow => {
                Bank::BinaryInputs
            }
            Self::MotorCoil | Self::PumpCoil | Self::HeaterCoil | Self::AlarmIndicator => {
                Bank::BinaryOutputs
            }
            Self::Temperature
            | Self::Pressure
            | Self::Flow
            | Self::AlarmStatus
            | Self::TemperatureSetpoint => Bank::IntegerOutputs,
            Self::TemperatureSensor | Self::PressureSensor | Self::FlowSensor => {
                Bank::IntegerInputs
            }
        }
    }

    /// Zero-based address inside [`IoRole::bank`].
    pub const fn address(self) -> usize {
        match self {
            Self::StartButton => 0,
            Self::StopButton => 1,
            Self::MotorFault => 2,
            Self::TankLevelLow => 3,
            Self::MotorCoil => 0,
            Self::PumpCoil => 1,
            Self::HeaterCoil => 2,
            Self::AlarmIndicator => 3,
            Self::Temperature => 0,
            Self::Pressure => 1,
            Self::Flow => 2,
            Self::AlarmStatus => 3,
            Self::TemperatureSetpoint => 4,
            Self::TemperatureSensor => 0,
            Self::PressureSensor => 1,
            Self::FlowSensor => 2,
        }
    }

    /// Smallest length `bank` needs to hold every role assigned to it.
    pub fn required_len(bank: Bank) -> usize {
        Self::ALL
            .iter()
            .filter(|role| role.bank() == bank)
            .map(|role| role.address() + 1)
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for IoRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}[{}]", self, self.bank(), self.address())
    }
}

impl FromStr for IoRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|role| format!("{role:?}") == s)
            .ok_or_else(|| format!("unknown IoRole: {s:?}"))
    }
}
