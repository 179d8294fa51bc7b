//! Supervisory interface errors.

use plc_common::image::MemoryError;
use thiserror::Error;

/// Rejected supervisory request. Mapped to HTTP 400 at the route layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupervisorError {
    /// Unknown action type.
    #[error("invalid action type: {0:?}")]
    InvalidAction(String),

    /// Value missing or not usable for the action.
    #[error("invalid value for {action}: {reason}")]
    InvalidValue {
        /// Action the value was supplied for.
        action: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// Negative or otherwise unrepresentable address.
    #[error("invalid address: {0}")]
    InvalidAddress(i64),

    /// Memory model refused the write.
    #[error(transparent)]
    Memory(#[from] MemoryError),
}
