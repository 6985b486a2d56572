//! `GET /ws` — live feed of completed exchanges.
//!
//! Each observer gets a `status` frame on connect, then every
//! `new_message` frame published after it subscribed.

use axum::{
    extract::{
        State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use chatrelay_core::event::EventFrame;
use futures::{SinkExt, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, info, warn};

use crate::SharedState;

pub const CONNECTED_STATUS: &str = "Connected to ChatRelay";

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_observer(socket, state))
}

fn encode(frame: &EventFrame) -> Option<WsMessage> {
    match serde_json::to_string(frame) {
        Ok(json) => Some(WsMessage::Text(json.into())),
        Err(e) => {
            warn!(event = %frame.event, error = %e, "Failed to encode frame");
            None
        }
    }
}

async fn handle_observer(socket: WebSocket, state: SharedState) {
    // Subscribe before greeting so nothing published in between is lost
    let rx = state.events.subscribe();
    info!(observers = state.events.subscriber_count(), "Observer connected");

    let (mut sender, mut receiver) = socket.split();

    if let Some(greeting) = encode(&EventFrame::status(CONNECTED_STATUS)) {
        if sender.send(greeting).await.is_err() {
            return;
        }
    }

    let mut forward = tokio::spawn(async move {
        let mut frames = BroadcastStream::new(rx);
        while let Some(item) = frames.next().await {
            match item {
                Ok(frame) => {
                    let Some(msg) = encode(&frame) else { continue };
                    if sender.send(msg).await.is_err() {
                        break; // observer went away
                    }
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Observer lagged; frames dropped");
                }
            }
        }
    });

    // Observers are read-only; drain until close
    let mut drain = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if matches!(msg, WsMessage::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut forward => drain.abort(),
        _ = &mut drain => forward.abort(),
    }

    debug!("Observer disconnected");
}
