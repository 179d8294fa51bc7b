//! Operator action payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SupervisorError;

/// Supported operator actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    /// Force a discrete input.
    SetInput,
    /// Write a holding register (clamped).
    SetRegister,
    /// Invert a discrete input.
    ToggleInput,
}

impl ActionType {
    /// Parse the `type` field. Accepts camelCase and snake_case spellings.
    pub fn parse(s: &str) -> Result<Self, SupervisorError> {
        match s {
            "setInput" | "set_input" => Ok(Self::SetInput),
            "setRegister" | "set_register" => Ok(Self::SetRegister),
            "toggleInput" | "toggle_input" => Ok(Self::ToggleInput),
            other => Err(SupervisorError::InvalidAction(other.to_string())),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SetInput => "setInput",
            Self::SetRegister => "setRegister",
            Self::ToggleInput => "toggleInput",
        }
    }
}

/// `POST /api/action` body and WebSocket `action` payload.
///
/// `type` stays a string here so an unknown action reaches the supervisor
/// and is answered with a 400 instead of an extractor rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    #[serde(rename = "type", alias = "action_type")]
    pub action_type: String,
    pub address: i64,
    #[serde(default)]
    pub value: Option<Value>,
}

impl ActionRequest {
    pub fn new(action: ActionType, address: i64, value: Option<Value>) -> Self {
        Self {
            action_type: action.as_str().to_string(),
            address,
            value,
        }
    }
}

/// Result of an operator action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Interpret a value as a bit: booleans, or numbers where non-zero is true.
pub(crate) fn value_as_bit(
    action: ActionType,
    value: Option<&Value>,
) -> Result<bool, SupervisorError> {
    match value {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) => Ok(f != 0.0),
            None => Err(invalid(action, format!("{n} is not a number"))),
        },
        Some(other) => Err(invalid(action, format!("expected boolean, got {other}"))),
        None => Err(invalid(action, "missing value".to_string())),
    }
}

/// Interpret a value as an integer: integers, finite floats (truncated) or
/// numeric strings.
pub(crate) fn value_as_int(
    action: ActionType,
    value: Option<&Value>,
) -> Result<i64, SupervisorError> {
    match value {
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if let Some(u) = n.as_u64() {
                Ok(i64::try_from(u).unwrap_or(i64::MAX))
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() => Ok(f.trunc() as i64),
                    _ => Err(invalid(action, format!("{n} is not finite"))),
                }
            }
        }
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(action, format!("{s:?} is not an integer"))),
        Some(other) => Err(invalid(action, format!("expected integer, got {other}"))),
        None => Err(invalid(action, "missing value".to_string())),
    }
}

fn invalid(action: ActionType, reason: String) -> SupervisorError {
    SupervisorError::InvalidValue {
        action: action.as_str(),
        reason,
    }
}
