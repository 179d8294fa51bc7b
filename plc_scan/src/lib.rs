//! # PLC Scan Engine
//!
//! Periodic execution of the fixed rung set over a shared
//! [`ProcessImage`](plc_common::image::ProcessImage).
//!
//! ## Cycle
//! 1. Rung evaluation: latched motor/pump/heater rungs, stateless alarm mask.
//! 2. Process update: temperature, pressure and flow model.
//! 3. Sensor mirror: IR0..=2 follow HR0..=2.
//!
//! Every step of one cycle runs under [`ProcessImage::lock_all`], and the
//! sleep between cycles runs outside all locks.
//!
//! [`ProcessImage::lock_all`]: plc_common::image::ProcessImage::lock_all

pub mod cycle;
pub mod engine;
pub mod error;
pub mod process;
pub mod rungs;
pub mod state;

pub use cycle::{CycleStats, ScanReport, execute_scan};
pub use engine::ScanEngine;
pub use error::{EngineError, ScanError};
pub use state::EngineState;
