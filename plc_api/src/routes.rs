//! HTTP and WebSocket routes.
//!
//! | Route | |
//! |-------|-|
//! | `GET /healthz` | liveness, returns `ok` |
//! | `GET /api/state` | [`PlcStateView`] |
//! | `POST /api/action` | [`ActionRequest`] → [`ActionResponse`] |
//! | `GET /ws` | push channel |

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::action::{ActionRequest, ActionResponse};
use crate::push::{ClientMessage, PushEvent};
use crate::supervisor::Supervisor;
use crate::view::PlcStateView;

/// Build the supervisory router.
pub fn build_router(supervisor: Arc<Supervisor>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/state", get(get_state))
        .route("/api/action", post(post_action))
        .route("/ws", get(ws_handler))
        .with_state(supervisor)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn get_state(State(supervisor): State<Arc<Supervisor>>) -> Json<PlcStateView> {
    Json(supervisor.get_state())
}

async fn post_action(
    State(supervisor): State<Arc<Supervisor>>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<ActionResponse>, (StatusCode, Json<ActionResponse>)> {
    supervisor.apply(&request).map(Json).map_err(|e| {
        warn!("Rejected action {request:?}: {e}");
        (StatusCode::BAD_REQUEST, Json(ActionResponse::failed(e.to_string())))
    })
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(supervisor): State<Arc<Supervisor>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(supervisor, socket))
}

fn encode(event: &PushEvent) -> Option<Message> {
    serde_json::to_string(event).ok().map(Message::Text)
}

async fn ws_connection(supervisor: Arc<Supervisor>, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let mut events_rx = supervisor.subscribe();
    // Replies meant for this client only.
    let (reply_tx, mut reply_rx) = mpsc::channel::<PushEvent>(16);

    if let Some(msg) = encode(&PushEvent::State(supervisor.get_state())) {
        if sender.send(msg).await.is_err() {
            return;
        }
    }

    let send_task = tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                event = events_rx.recv() => match event {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("WebSocket subscriber lagged, skipped {skipped} event(s)");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                reply = reply_rx.recv() => match reply {
                    Some(reply) => reply,
                    None => break,
                },
            };
            let Some(msg) = encode(&event) else { continue };
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let error = match serde_json::from_str::<ClientMessage>(&text) {
            Ok(ClientMessage::Action(payload)) => match supervisor.apply(&payload.into_request()) {
                // Accepted actions reach this client through the broadcast.
                Ok(_) => None,
                Err(e) => Some(e.to_string()),
            },
            Err(_) => Some("Invalid JSON message".to_string()),
        };
        if let Some(error) = error {
            warn!("WebSocket client message rejected: {error}");
            if reply_tx.send(PushEvent::Error(error)).await.is_err() {
                break;
            }
        }
    }

    send_task.abort();
    debug!("WebSocket client disconnected");
}
