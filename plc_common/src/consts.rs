//! System-wide constants for the PLC simulator workspace.
//!
//! Single source of truth for bank sizing, timing defaults and the
//! process-model limits. Imported by all crates; never duplicate a value locally.

/// Reference length of every register bank.
pub const DEFAULT_BANK_LEN: usize = 64;

/// Largest bank a 16-bit Modbus address space can reach.
pub const MAX_BANK_LEN: usize = 65_536;

/// Number of addresses per bank surfaced by the supervisory interface.
pub const DEFAULT_STATE_WINDOW: usize = 8;

/// Default scan period in milliseconds.
pub const DEFAULT_SCAN_PERIOD_MS: u64 = 100;

/// Default protocol mirror period in milliseconds.
pub const DEFAULT_MIRROR_PERIOD_MS: u64 = 50;

/// Default push-channel broadcast interval in milliseconds.
pub const DEFAULT_PUSH_INTERVAL_MS: u64 = 1000;

/// Default Modbus/TCP listen address.
pub const DEFAULT_MODBUS_BIND: &str = "127.0.0.1:1502";

/// Default supervisory HTTP listen address.
pub const DEFAULT_API_BIND: &str = "0.0.0.0:8000";

/// Default service identifier.
pub const DEFAULT_SERVICE_NAME: &str = "plc-sim";

// ─── Process model ──────────────────────────────────────────────────

/// Temperature seeded into the process at startup.
pub const INITIAL_TEMPERATURE: u16 = 800;

/// Temperature setpoint seeded at startup.
pub const INITIAL_TEMPERATURE_SETPOINT: u16 = 800;

/// Heater switches on below `setpoint - HEATER_ON_BAND`.
pub const HEATER_ON_BAND: i32 = 20;

/// Heater switches off above `setpoint + HEATER_OFF_BAND`.
pub const HEATER_OFF_BAND: i32 = 10;

/// Over-temperature alarm threshold (exclusive).
pub const OVER_TEMPERATURE_LIMIT: u16 = 1200;

/// Over-pressure alarm threshold (exclusive).
pub const OVER_PRESSURE_LIMIT: u16 = 1000;

/// Temperature ceiling while heating.
pub const TEMPERATURE_MAX: u16 = 1500;

/// Ambient floor the process cools down to.
pub const TEMPERATURE_MIN: u16 = 200;

/// Temperature gain per scan while the heater is on.
pub const HEATING_RATE: u16 = 2;

/// Temperature loss per scan while the heater is off.
pub const COOLING_RATE: u16 = 1;

/// Pressure ceiling while the pump runs.
pub const PRESSURE_MAX: u16 = 1200;

/// Pressure gain per scan while the pump runs.
pub const PRESSURE_RISE_RATE: u16 = 5;

/// Pressure loss per scan while the pump is stopped.
pub const PRESSURE_DECAY_RATE: u16 = 3;

/// Minimum pressure before flow starts building.
pub const FLOW_PRESSURE_THRESHOLD: u16 = 100;

/// Flow ceiling.
pub const FLOW_MAX: u16 = 100;

/// Flow gain per scan.
pub const FLOW_RISE_RATE: u16 = 2;

/// Flow loss per scan.
pub const FLOW_DECAY_RATE: u16 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(DEFAULT_BANK_LEN > 0 && DEFAULT_BANK_LEN <= MAX_BANK_LEN);
        assert!(DEFAULT_STATE_WINDOW <= DEFAULT_BANK_LEN);
        assert!(DEFAULT_SCAN_PERIOD_MS > 0);
        assert!(DEFAULT_MIRROR_PERIOD_MS < DEFAULT_SCAN_PERIOD_MS);
    }

    #[test]
    fn process_limits_are_ordered() {
        assert!(TEMPERATURE_MIN < INITIAL_TEMPERATURE);
        assert!(INITIAL_TEMPERATURE < TEMPERATURE_MAX);
        assert!(OVER_TEMPERATURE_LIMIT < TEMPERATURE_MAX);
        assert!(OVER_PRESSURE_LIMIT < PRESSURE_MAX);
        assert!(FLOW_PRESSURE_THRESHOLD < PRESSURE_MAX);
    }
}
