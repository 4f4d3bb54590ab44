//! Persistence for pairing codes, paired users, and relayed messages.
//!
//! The [`Store`] trait is the seam between the pairing flow and its
//! backend. [`MemoryStore`] keeps everything in process-local maps and
//! always compiles; [`postgres::PostgresStore`] persists to PostgreSQL
//! behind the `postgres` feature.

mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::{migrate, PostgresStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreError;
use crate::pairing::CodeHash;

/// A pairing code awaiting insertion.
#[derive(Debug, Clone)]
pub struct NewCode {
    pub hash: CodeHash,
    pub created_at: DateTime<Utc>,
}

/// A stored pairing code.
#[derive(Debug, Clone)]
pub struct CodeRecord {
    pub id: Uuid,
    pub hash: CodeHash,
    pub created_at: DateTime<Utc>,
}

/// A paired user awaiting insertion.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub display_name: String,
    pub device_id: Option<String>,
    pub room_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A stored paired user.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub display_name: String,
    pub device_id: Option<String>,
    pub room_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A relayed message awaiting insertion.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub room_id: String,
    pub sender_id: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

/// A stored relayed message.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub id: Uuid,
    pub room_id: String,
    pub sender_id: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

/// Persistence operations shared by both backends.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a hashed pairing code and return its row id. The row id
    /// doubles as the room id handed to the desktop client.
    async fn insert_code(&self, code: NewCode) -> Result<Uuid, StoreError>;

    /// All codes created strictly after `cutoff`.
    async fn live_codes(&self, cutoff: DateTime<Utc>) -> Result<Vec<CodeRecord>, StoreError>;

    /// Delete a code if it is still present and fresh, returning whether
    /// this caller removed it. Of two concurrent claimers exactly one
    /// gets `true`.
    async fn claim_code(&self, id: Uuid, cutoff: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Delete codes created at or before `cutoff`, returning how many
    /// were removed.
    async fn purge_expired_codes(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Insert a paired user and return its row id.
    async fn insert_user(&self, user: NewUser) -> Result<Uuid, StoreError>;

    /// Append a relayed message to the history log.
    async fn append_message(&self, message: NewMessage) -> Result<(), StoreError>;
}
