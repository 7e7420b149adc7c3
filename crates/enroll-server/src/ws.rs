//! `WebSocket` handler for real-time roster streaming.
//!
//! Clients connect to `GET /ws/rosters`. The first frame is the full
//! roster snapshot (`{"type": "snapshot", "activities": {...}}`); every
//! later frame is one roster event (`{"type": "event", ...}`).
//!
//! The handler subscribes before taking the snapshot, so no event that
//! follows the snapshot is missed. An event already reflected in the
//! snapshot may be delivered once more. If a client falls behind, lagged
//! events are skipped and the client resumes from the most recent one.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use enroll_types::{RosterEvent, RosterSnapshot};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RosterFrame {
    Snapshot { activities: RosterSnapshot },
    Event(RosterEvent),
}

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming roster changes.
///
/// # Route
///
/// `GET /ws/rosters`
pub async fn ws_rosters(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

async fn send_frame(socket: &mut WebSocket, frame: &RosterFrame) -> bool {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize roster frame: {e}");
            return true;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    let mut rx = state.subscribe();

    let snapshot = RosterFrame::Snapshot {
        activities: state.service.handle_list(),
    };
    if !send_frame(&mut socket, &snapshot).await {
        debug!("WebSocket client disconnected before snapshot");
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if !send_frame(&mut socket, &RosterFrame::Event(event)).await {
                            debug!("WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Roster event channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    // Client text and binary frames carry no commands.
                    _ => {}
                }
            }
        }
    }
}
