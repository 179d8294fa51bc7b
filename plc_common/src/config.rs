//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load the TOML configuration
//! file shared by every crate in the workspace. All values are fixed at
//! process start; there is no hot reload.
//!
//! # Usage
//!
//! ```rust,no_run
//! use plc_common::config::{ConfigLoader, PlcConfig, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = PlcConfig::load(Path::new("config/plc.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::consts::{
    DEFAULT_API_BIND, DEFAULT_MIRROR_PERIOD_MS, DEFAULT_MODBUS_BIND, DEFAULT_PUSH_INTERVAL_MS,
    DEFAULT_SCAN_PERIOD_MS, DEFAULT_SERVICE_NAME, DEFAULT_STATE_WINDOW, MAX_BANK_LEN,
};
use crate::image::{Bank, BankSizes};
use crate::io::IoRole;

/// Error type for configuration loading operations.
///
/// This enum represents all possible errors that can occur when loading
/// configuration files.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "plc-sim-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `service_name` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// `[scan]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Scan period in milliseconds.
    pub period_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_SCAN_PERIOD_MS,
        }
    }
}

impl ScanConfig {
    /// Scan period as a `Duration`.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

/// How the protocol server reaches the process image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModbusBacking {
    /// Serve requests straight from the live image.
    #[default]
    Direct,
    /// Serve reads from a periodically refreshed copy.
    Mirrored,
}

/// `[modbus]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModbusConfig {
    /// Listen address, e.g. `127.0.0.1:1502`.
    pub bind: String,
    /// Backing variant.
    pub backing: ModbusBacking,
    /// Mirror refresh period in milliseconds (mirrored backing only).
    pub mirror_period_ms: u64,
}

impl Default for ModbusConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_MODBUS_BIND.to_string(),
            backing: ModbusBacking::default(),
            mirror_period_ms: DEFAULT_MIRROR_PERIOD_MS,
        }
    }
}

impl ModbusConfig {
    /// Parsed listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind.parse().map_err(|e| {
            ConfigError::ValidationError(format!("modbus.bind {:?}: {e}", self.bind))
        })
    }

    /// Replace the port of the listen address.
    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        let mut addr = self.bind_addr()?;
        addr.set_port(port);
        self.bind = addr.to_string();
        Ok(())
    }

    /// Mirror period as a `Duration`.
    pub fn mirror_period(&self) -> Duration {
        Duration::from_millis(self.mirror_period_ms)
    }
}

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// HTTP listen address.
    pub bind: String,
    /// Periodic push interval in milliseconds.
    pub push_interval_ms: u64,
    /// Addresses per bank surfaced in state views.
    pub state_window: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_API_BIND.to_string(),
            push_interval_ms: DEFAULT_PUSH_INTERVAL_MS,
            state_window: DEFAULT_STATE_WINDOW,
        }
    }
}

impl ApiConfig {
    /// Parsed listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|e| ConfigError::ValidationError(format!("api.bind {:?}: {e}", self.bind)))
    }

    /// Push interval as a `Duration`.
    pub fn push_interval(&self) -> Duration {
        Duration::from_millis(self.push_interval_ms)
    }
}

/// Whole-process configuration.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "plc-sim"
///
/// [memory]
/// binary_inputs = 64
///
/// [scan]
/// period_ms = 100
///
/// [modbus]
/// bind = "127.0.0.1:1502"
/// backing = "mirrored"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlcConfig {
    /// Common fields.
    pub shared: SharedConfig,
    /// Bank lengths.
    pub memory: BankSizes,
    /// Scan engine timing.
    pub scan: ScanConfig,
    /// Protocol server.
    pub modbus: ModbusConfig,
    /// Supervisory interface.
    pub api: ApiConfig,
}

impl PlcConfig {
    /// Validate cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - a bank is empty, longer than 65536, shorter than its highest role
    ///   address + 1 or shorter than the state window
    /// - any period is zero
    /// - a listen address does not parse
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        for bank in Bank::ALL {
            let len = self.memory.get(bank);
            if len == 0 || len > MAX_BANK_LEN {
                return Err(ConfigError::ValidationError(format!(
                    "memory.{bank} = {len}, must be in 1..={MAX_BANK_LEN}"
                )));
            }
            let required = IoRole::required_len(bank);
            if len < required {
                return Err(ConfigError::ValidationError(format!(
                    "memory.{bank} = {len}, rung roles need at least {required}"
                )));
            }
            if len < self.api.state_window {
                return Err(ConfigError::ValidationError(format!(
                    "memory.{bank} = {len} is shorter than api.state_window = {}",
                    self.api.state_window
                )));
            }
        }

        if self.scan.period_ms == 0 {
            return Err(ConfigError::ValidationError(
                "scan.period_ms must be > 0".to_string(),
            ));
        }
        if self.modbus.mirror_period_ms == 0 {
            return Err(ConfigError::ValidationError(
                "modbus.mirror_period_ms must be > 0".to_string(),
            ));
        }
        if self.api.push_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "api.push_interval_ms must be > 0".to_string(),
            ));
        }

        self.modbus.bind_addr()?;
        self.api.bind_addr()?;
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
