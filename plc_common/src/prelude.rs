//! Prelude module for common re-exports.
//!
//! ```rust
//! use plc_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ApiConfig, ConfigError, ConfigLoader, ModbusBacking, ModbusConfig, PlcConfig, ScanConfig,
    SharedConfig,
};

// ─── Memory model ───────────────────────────────────────────────────
pub use crate::image::{
    Bank, BankSizes, ControllerState, ImageGuard, ImageSnapshot, MemoryError, PointKind,
    PointValue, ProcessImage,
};

// ─── I/O ────────────────────────────────────────────────────────────
pub use crate::io::IoRole;
