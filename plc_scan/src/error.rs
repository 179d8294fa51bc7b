//! Scan engine errors.

use plc_common::image::MemoryError;
use thiserror::Error;

/// Failure inside one scan cycle. The cycle is skipped; the engine keeps
/// running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// Rung or process pass hit a rejected memory access.
    #[error("memory access failed: {0}")]
    Memory(#[from] MemoryError),

    /// Cycle body panicked.
    #[error("scan cycle panicked: {0}")]
    Panicked(String),
}

/// Engine lifecycle misuse or setup failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// `start` while the scan thread is running.
    #[error("scan engine is already running")]
    AlreadyRunning,

    /// `stop` on an engine that is not running.
    #[error("scan engine is not running")]
    NotRunning,

    /// `start` after the engine was stopped. Engines do not resume.
    #[error("scan engine cannot restart after stop")]
    RestartAfterStop,

    /// Initial process conditions could not be written.
    #[error("failed to seed initial conditions: {0}")]
    Seed(#[from] MemoryError),

    /// OS refused to spawn the scan thread.
    #[error("failed to spawn scan thread: {0}")]
    Spawn(String),
}
