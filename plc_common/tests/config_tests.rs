//! Config loading tests.
//!
//! Full-file loading, section defaults, backing selection and semantic
//! validation of bank sizes against the rung role map.

use plc_common::config::{ConfigError, ConfigLoader, LogLevel, ModbusBacking, PlcConfig};
use plc_common::image::BankSizes;
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("plc.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn full_config_loads() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[shared]
log_level = "debug"
service_name = "line-3-plc"

[memory]
binary_inputs = 32
binary_outputs = 32
integer_inputs = 16
integer_outputs = 128

[scan]
period_ms = 250

[modbus]
bind = "0.0.0.0:5020"
backing = "mirrored"
mirror_period_ms = 20

[api]
bind = "127.0.0.1:9000"
push_interval_ms = 500
state_window = 16
"#,
    );

    let config = PlcConfig::load(&path).unwrap();
    config.validate().unwrap();

    assert_eq!(config.shared.log_level, LogLevel::Debug);
    assert_eq!(config.shared.service_name, "line-3-plc");
    assert_eq!(
        config.memory,
        BankSizes {
            binary_inputs: 32,
            binary_outputs: 32,
            integer_inputs: 16,
            integer_outputs: 128,
        }
    );
    assert_eq!(config.scan.period_ms, 250);
    assert_eq!(config.modbus.backing, ModbusBacking::Mirrored);
    assert_eq!(config.modbus.bind_addr().unwrap().port(), 5020);
    assert_eq!(config.api.state_window, 16);
}

#[test]
fn missing_sections_use_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[scan]\nperiod_ms = 50\n");

    let config = PlcConfig::load(&path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.scan.period_ms, 50);
    assert_eq!(config.modbus.backing, ModbusBacking::Direct);
    assert_eq!(config.memory, BankSizes::uniform(64));
    assert_eq!(config.shared.service_name, "plc-sim");
}

#[test]
fn empty_file_is_all_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");
    let config = PlcConfig::load(&path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.api.push_interval_ms, 1000);
}

#[test]
fn unknown_backing_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[modbus]\nbacking = \"shared\"\n");
    assert!(matches!(
        PlcConfig::load(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn oversized_bank_fails_validation() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[memory]\ninteger_outputs = 70000\n");
    let config = PlcConfig::load(&path).unwrap();
    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
    assert!(err.to_string().contains("integer_outputs"));
}

#[test]
fn bad_bind_address_fails_validation() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[api]\nbind = \"localhost\"\n");
    let config = PlcConfig::load(&path).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError(_))
    ));
}
