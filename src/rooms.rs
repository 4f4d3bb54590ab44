//! Room membership and fan-out.
//!
//! A room is the shared channel between one desktop client and the
//! mobile clients paired to it. Rooms are created on first join and
//! dropped when the last member leaves; nothing about membership is
//! persisted.

use std::collections::HashMap;
use std::fmt;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::relay::ServerEvent;

/// Identity of one connected websocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointId(Uuid);

impl EndpointId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EndpointId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

type Members = HashMap<EndpointId, mpsc::UnboundedSender<ServerEvent>>;

/// Live room membership, keyed by room id.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, Members>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an endpoint to a room, creating the room on first join.
    /// Returns the member count after joining.
    pub fn join(
        &self,
        room_id: &str,
        endpoint: EndpointId,
        handle: mpsc::UnboundedSender<ServerEvent>,
    ) -> usize {
        let mut members = self.rooms.entry(room_id.to_string()).or_default();
        members.insert(endpoint, handle);
        members.len()
    }

    /// Send an event to every room member except `sender`, returning
    /// how many members it reached.
    pub fn broadcast(&self, room_id: &str, sender: EndpointId, event: &ServerEvent) -> usize {
        // Senders are cloned out so no map guard is held while
        // delivering.
        let recipients: Vec<(EndpointId, mpsc::UnboundedSender<ServerEvent>)> =
            match self.rooms.get(room_id) {
                Some(members) => members
                    .iter()
                    .filter(|(id, _)| **id != sender)
                    .map(|(id, tx)| (*id, tx.clone()))
                    .collect(),
                None => return 0,
            };

        let mut delivered = 0;
        for (id, tx) in recipients {
            if tx.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!(endpoint = %id, room = %room_id, "Dropping event for closed endpoint");
            }
        }
        delivered
    }

    /// Remove an endpoint from a room, dropping the room once empty.
    pub fn leave(&self, room_id: &str, endpoint: EndpointId) {
        if let Some(mut members) = self.rooms.get_mut(room_id) {
            members.remove(&endpoint);
        }
        self.rooms.remove_if(room_id, |_, members| members.is_empty());
    }

    /// Remove an endpoint from every room it joined, returning how many
    /// rooms it left.
    pub fn disconnect(&self, endpoint: EndpointId) -> usize {
        let joined: Vec<String> = self
            .rooms
            .iter()
            .filter(|entry| entry.value().contains_key(&endpoint))
            .map(|entry| entry.key().clone())
            .collect();

        for room_id in &joined {
            self.leave(room_id, endpoint);
        }

        joined.len()
    }

    /// Current member count of a room.
    pub fn member_count(&self, room_id: &str) -> usize {
        self.rooms.get(room_id).map_or(0, |members| members.len())
    }

    /// Number of rooms with at least one member.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
