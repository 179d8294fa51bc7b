//! Engine lifecycle state machine.
//!
//! ```text
//! Stopped ──Start──▶ Running ──Stop──▶ Stopped (final)
//! ```
//!
//! An engine that has run once does not accept another `Start`.

use core::fmt;

use crate::error::EngineError;

/// Externally visible engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// No scan thread. Initial and final state.
    Stopped,
    /// Scan thread is ticking.
    Running,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Running => write!(f, "running"),
        }
    }
}

/// Lifecycle requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    Start,
    Stop,
}

/// Lifecycle tracker.
#[derive(Debug, Clone, Copy)]
pub struct Lifecycle {
    state: EngineState,
    has_run: bool,
}

impl Lifecycle {
    /// Fresh, never-started lifecycle.
    pub const fn new() -> Self {
        Self {
            state: EngineState::Stopped,
            has_run: false,
        }
    }

    /// Current state.
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// Apply `command`, returning the new state or the reason it was refused.
    /// A refused command leaves the state unchanged.
    pub fn transition(&mut self, command: EngineCommand) -> Result<EngineState, EngineError> {
        let next = match (self.state, command) {
            (EngineState::Running, EngineCommand::Start) => {
                return Err(EngineError::AlreadyRunning);
            }
            (EngineState::Stopped, EngineCommand::Start) if self.has_run => {
                return Err(EngineError::RestartAfterStop);
            }
            (EngineState::Stopped, EngineCommand::Start) => {
                self.has_run = true;
                EngineState::Running
            }
            (EngineState::Running, EngineCommand::Stop) => EngineState::Stopped,
            (EngineState::Stopped, EngineCommand::Stop) => {
                return Err(EngineError::NotRunning);
            }
        };
        self.state = next;
        Ok(next)
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
