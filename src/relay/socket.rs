//! Websocket transport for the relay.
//!
//! Each connection gets an [`EndpointId`] and an unbounded channel; the
//! channel's sender is what rooms hold, so fan-out never touches the
//! socket directly. One select loop per connection pumps both
//! directions until the peer goes away.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::rooms::EndpointId;

use super::engine::RelayEngine;
use super::protocol::{ClientEvent, ServerEvent};

/// Websocket routes.
pub fn routes(engine: Arc<RelayEngine>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(engine)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(engine): State<Arc<RelayEngine>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, engine))
}

async fn handle_socket(socket: WebSocket, engine: Arc<RelayEngine>) {
    let endpoint = EndpointId::new();
    info!(endpoint = %endpoint, "Endpoint connected");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    loop {
        tokio::select! {
            // Events fanned out by rooms this endpoint joined.
            Some(event) = rx.recv() => {
                let frame = match serde_json::to_string(&event) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(endpoint = %endpoint, error = %e, "Failed to encode server event");
                        continue;
                    }
                };
                if sink.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }

            // Frames from this endpoint's socket.
            frame = stream.next() => {
                if handle_frame(&engine, endpoint, &tx, frame) == FrameOutcome::Disconnect {
                    break;
                }
            }
        }
    }

    engine.disconnect(endpoint);
    info!(endpoint = %endpoint, "Endpoint disconnected");
}

/// Whether the connection loop keeps pumping after an inbound frame.
#[derive(Debug, PartialEq)]
enum FrameOutcome {
    Continue,
    Disconnect,
}

/// Apply one inbound frame. Malformed events are dropped without
/// closing the connection; only a close frame, stream end, or
/// transport error tears it down.
fn handle_frame(
    engine: &RelayEngine,
    endpoint: EndpointId,
    handle: &mpsc::UnboundedSender<ServerEvent>,
    frame: Option<Result<Message, axum::Error>>,
) -> FrameOutcome {
    match frame {
        Some(Ok(Message::Text(text))) => {
            match serde_json::from_str::<ClientEvent>(text.as_str()) {
                Ok(event) => engine.handle_event(endpoint, handle, event),
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, "Ignoring malformed event");
                }
            }
            FrameOutcome::Continue
        }
        Some(Ok(Message::Close(_))) | None => FrameOutcome::Disconnect,
        Some(Ok(_)) => FrameOutcome::Continue,
        Some(Err(e)) => {
            debug!(endpoint = %endpoint, error = %e, "Socket error");
            FrameOutcome::Disconnect
        }
    }
}
