//! In-memory store for tests and single-node runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;

use super::{CodeRecord, MessageRecord, NewCode, NewMessage, NewUser, Store, UserRecord};

/// Store backed by process-local maps. State does not survive restarts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    codes: RwLock<HashMap<Uuid, CodeRecord>>,
    users: RwLock<HashMap<Uuid, UserRecord>>,
    messages: RwLock<Vec<MessageRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored codes, live or expired.
    pub async fn code_count(&self) -> usize {
        self.codes.read().await.len()
    }

    /// Number of paired users.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Number of logged messages.
    pub async fn message_count(&self) -> usize {
        self.messages.read().await.len()
    }

    /// Messages logged for one room, oldest first.
    pub async fn messages_for_room(&self, room_id: &str) -> Vec<MessageRecord> {
        self.messages
            .read()
            .await
            .iter()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_code(&self, code: NewCode) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        let record = CodeRecord {
            id,
            hash: code.hash,
            created_at: code.created_at,
        };
        self.codes.write().await.insert(id, record);
        Ok(id)
    }

    async fn live_codes(&self, cutoff: DateTime<Utc>) -> Result<Vec<CodeRecord>, StoreError> {
        Ok(self
            .codes
            .read()
            .await
            .values()
            .filter(|record| record.created_at > cutoff)
            .cloned()
            .collect())
    }

    async fn claim_code(&self, id: Uuid, cutoff: DateTime<Utc>) -> Result<bool, StoreError> {
        // Check and remove under one write guard so two concurrent
        // claimers cannot both see the code.
        let mut codes = self.codes.write().await;
        match codes.get(&id) {
            Some(record) if record.created_at > cutoff => {
                codes.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge_expired_codes(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut codes = self.codes.write().await;
        let before = codes.len();
        codes.retain(|_, record| record.created_at > cutoff);
        Ok((before - codes.len()) as u64)
    }

    async fn insert_user(&self, user: NewUser) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        let record = UserRecord {
            id,
            display_name: user.display_name,
            device_id: user.device_id,
            room_id: user.room_id,
            created_at: user.created_at,
        };
        self.users.write().await.insert(id, record);
        Ok(id)
    }

    async fn append_message(&self, message: NewMessage) -> Result<(), StoreError> {
        let record = MessageRecord {
            id: Uuid::new_v4(),
            room_id: message.room_id,
            sender_id: message.sender_id,
            payload: message.payload,
            created_at: message.created_at,
        };
        self.messages.write().await.push(record);
        Ok(())
    }
}
