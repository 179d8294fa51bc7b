//! Stateless rungs.
//!
//! Recomputed from scratch every scan; nothing is carried over.

use bitflags::bitflags;
use plc_common::consts::{OVER_PRESSURE_LIMIT, OVER_TEMPERATURE_LIMIT};

bitflags! {
    /// Alarm status word written to the alarm-status holding register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AlarmMask: u16 {
        /// Temperature above the over-temperature limit.
        const OVER_TEMPERATURE = 0x0001;
        /// Pressure above the over-pressure limit.
        const OVER_PRESSURE    = 0x0002;
        /// Motor fault input active.
        const MOTOR_FAULT      = 0x0004;
    }
}

impl Default for AlarmMask {
    fn default() -> Self {
        Self::empty()
    }
}

/// Build the alarm mask for this scan.
pub fn alarm_mask(temperature: u16, pressure: u16, motor_fault: bool) -> AlarmMask {
    let mut mask = AlarmMask::empty();
    if temperature > OVER_TEMPERATURE_LIMIT {
        mask |= AlarmMask::OVER_TEMPERATURE;
    }
    if pressure > OVER_PRESSURE_LIMIT {
        mask |= AlarmMask::OVER_PRESSURE;
    }
    if motor_fault {
        mask |= AlarmMask::MOTOR_FAULT;
    }
    mask
}
