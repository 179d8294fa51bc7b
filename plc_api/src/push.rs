//! Push channel: broadcast events and the periodic state broadcaster.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::action::{ActionRequest, ActionType};
use crate::supervisor::Supervisor;
use crate::view::PlcStateView;

/// Capacity of the broadcast channel. Slow subscribers skip events.
pub const PUSH_CHANNEL_CAPACITY: usize = 64;

/// Server to client message: `{"kind": "...", "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum PushEvent {
    /// Current state view.
    State(PlcStateView),
    /// Rejected client message (sent to that client only).
    Error(String),
}

/// Client to server message over the WebSocket.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Operator action.
    Action(ActionPayload),
}

/// Payload of a WebSocket action.
///
/// Older clients send `{"flip": <address>}` to toggle a binary input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ActionPayload {
    Request(ActionRequest),
    Flip { flip: i64 },
}

impl ActionPayload {
    /// The action to apply.
    pub fn into_request(self) -> ActionRequest {
        match self {
            Self::Request(request) => request,
            Self::Flip { flip } => ActionRequest::new(ActionType::ToggleInput, flip, None),
        }
    }
}

/// Broadcast the current state every `interval`.
pub fn spawn_state_broadcaster(supervisor: Arc<Supervisor>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let receivers = supervisor.publish_state();
            if receivers > 0 {
                debug!("State pushed to {receivers} subscriber(s)");
            }
        }
    })
}
