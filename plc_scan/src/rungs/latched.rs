//! Latched rungs.
//!
//! Each function returns the next value of an explicit state bit. When no
//! trigger condition fires the prior value is held.

use plc_common::consts::{HEATER_OFF_BAND, HEATER_ON_BAND};

/// Motor seal-in: start sets, stop or fault resets, otherwise hold.
#[inline]
pub fn motor(prior: bool, start: bool, stop: bool, fault: bool) -> bool {
    if start && !stop && !fault {
        true
    } else if stop || fault {
        false
    } else {
        prior
    }
}

/// Pump follows the motor: runs on motor + low tank, drops with the motor,
/// otherwise holds.
#[inline]
pub fn pump(prior: bool, motor_running: bool, tank_level_low: bool) -> bool {
    if motor_running && tank_level_low {
        true
    } else if !motor_running {
        false
    } else {
        prior
    }
}

/// Heater with hysteresis around the setpoint.
///
/// ON below `setpoint - 20`, OFF above `setpoint + 10`, hold in between.
#[inline]
pub fn heater(prior: bool, temperature: u16, setpoint: u16) -> bool {
    let temperature = i32::from(temperature);
    let setpoint = i32::from(setpoint);
    if temperature < setpoint - HEATER_ON_BAND {
        true
    } else if temperature > setpoint + HEATER_OFF_BAND {
        false
    } else {
        prior
    }
}
