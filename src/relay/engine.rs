//! Event handling behind each websocket.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::rooms::{EndpointId, RoomRegistry};
use crate::store::{NewMessage, Store};

use super::protocol::{ClientEvent, ServerEvent};

/// Applies client events to room state and fans the results out.
pub struct RelayEngine {
    rooms: Arc<RoomRegistry>,
    store: Arc<dyn Store>,
}

impl RelayEngine {
    pub fn new(rooms: Arc<RoomRegistry>, store: Arc<dyn Store>) -> Self {
        Self { rooms, store }
    }

    /// Apply one client event. `handle` is where server events for this
    /// endpoint are delivered once it joins a room.
    pub fn handle_event(
        &self,
        endpoint: EndpointId,
        handle: &UnboundedSender<ServerEvent>,
        event: ClientEvent,
    ) {
        match event {
            ClientEvent::PcJoin { room_id } => {
                let members = self.rooms.join(&room_id, endpoint, handle.clone());
                info!(room = %room_id, endpoint = %endpoint, members, "PC joined room");
            }
            ClientEvent::MobileJoin { room_id } => {
                let members = self.rooms.join(&room_id, endpoint, handle.clone());
                let notified = self
                    .rooms
                    .broadcast(&room_id, endpoint, &ServerEvent::MobileConnected);
                info!(
                    room = %room_id,
                    endpoint = %endpoint,
                    members,
                    notified,
                    "Mobile joined room"
                );
            }
            ClientEvent::SendData { room_id, payload } => {
                self.relay(endpoint, &room_id, payload);
            }
        }
    }

    /// Fan a payload out to the rest of the room, then log it without
    /// holding up delivery.
    fn relay(&self, endpoint: EndpointId, room_id: &str, payload: Value) {
        let delivered = self.rooms.broadcast(
            room_id,
            endpoint,
            &ServerEvent::ReceiveData {
                payload: payload.clone(),
            },
        );
        debug!(room = %room_id, endpoint = %endpoint, delivered, "Relayed payload");

        let store = self.store.clone();
        let message = NewMessage {
            room_id: room_id.to_string(),
            sender_id: endpoint.to_string(),
            payload,
            created_at: Utc::now(),
        };
        tokio::spawn(async move {
            if let Err(e) = store.append_message(message).await {
                warn!(error = %e, "Message log append failed");
            }
        });
    }

    /// Drop an endpoint from every room when its socket closes.
    pub fn disconnect(&self, endpoint: EndpointId) {
        let rooms_left = self.rooms.disconnect(endpoint);
        if rooms_left > 0 {
            debug!(endpoint = %endpoint, rooms = rooms_left, "Removed endpoint from rooms");
        }
    }
}
