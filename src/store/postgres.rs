//! PostgreSQL store.
//!
//! Schema lives in `migrations/` and is applied with refinery at
//! startup. Queries go through a deadpool connection pool; every
//! statement is a single parameterized round trip, and single-use code
//! claims lean on row-level delete atomicity instead of transactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Pool, Runtime};
use tokio_postgres::NoTls;
use uuid::Uuid;

use crate::error::StoreError;
use crate::pairing::CodeHash;

use super::{CodeRecord, NewCode, NewMessage, NewUser, Store};

mod embedded {
    refinery::embed_migrations!("migrations");
}

/// Apply pending schema migrations.
pub async fn migrate(database_url: &str) -> Result<(), StoreError> {
    let (mut client, connection) = tokio_postgres::connect(database_url, NoTls).await?;

    // The connection task drives the socket until the client drops.
    let driver = tokio::spawn(connection);

    embedded::migrations::runner()
        .run_async(&mut client)
        .await
        .map_err(|e| StoreError::Migration(e.to_string()))?;

    drop(client);
    let _ = driver.await;
    Ok(())
}

/// Store backed by PostgreSQL.
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    /// Create a connection pool and verify it with a round trip, so a
    /// bad DATABASE_URL fails at startup rather than on first request.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let config = deadpool_postgres::Config {
            url: Some(database_url.to_string()),
            ..Default::default()
        };

        let pool = config.create_pool(Some(Runtime::Tokio1), NoTls)?;

        let client = pool.get().await?;
        client.execute("SELECT 1", &[]).await?;

        Ok(Self { pool })
    }

    /// Get a connection from the pool.
    async fn conn(&self) -> Result<deadpool_postgres::Object, StoreError> {
        Ok(self.pool.get().await?)
    }

    fn row_to_code(&self, row: &tokio_postgres::Row) -> CodeRecord {
        CodeRecord {
            id: row.get("id"),
            hash: CodeHash {
                salt: row.get("salt"),
                digest: row.get("digest"),
            },
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn insert_code(&self, code: NewCode) -> Result<Uuid, StoreError> {
        let conn = self.conn().await?;
        let id = Uuid::new_v4();

        conn.execute(
            r#"
            INSERT INTO pairing_codes (id, salt, digest, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
            &[&id, &code.hash.salt, &code.hash.digest, &code.created_at],
        )
        .await?;

        Ok(id)
    }

    async fn live_codes(&self, cutoff: DateTime<Utc>) -> Result<Vec<CodeRecord>, StoreError> {
        let conn = self.conn().await?;

        let rows = conn
            .query(
                "SELECT id, salt, digest, created_at FROM pairing_codes WHERE created_at > $1",
                &[&cutoff],
            )
            .await?;

        Ok(rows.iter().map(|r| self.row_to_code(r)).collect())
    }

    async fn claim_code(&self, id: Uuid, cutoff: DateTime<Utc>) -> Result<bool, StoreError> {
        let conn = self.conn().await?;

        // A conditional delete is atomic per row, so of two concurrent
        // claimers exactly one sees an affected row.
        let deleted = conn
            .execute(
                "DELETE FROM pairing_codes WHERE id = $1 AND created_at > $2",
                &[&id, &cutoff],
            )
            .await?;

        Ok(deleted > 0)
    }

    async fn purge_expired_codes(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let conn = self.conn().await?;

        let deleted = conn
            .execute("DELETE FROM pairing_codes WHERE created_at <= $1", &[&cutoff])
            .await?;

        Ok(deleted)
    }

    async fn insert_user(&self, user: NewUser) -> Result<Uuid, StoreError> {
        let conn = self.conn().await?;
        let id = Uuid::new_v4();

        conn.execute(
            r#"
            INSERT INTO paired_users (id, display_name, device_id, room_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
            &[
                &id,
                &user.display_name,
                &user.device_id,
                &user.room_id,
                &user.created_at,
            ],
        )
        .await?;

        Ok(id)
    }

    async fn append_message(&self, message: NewMessage) -> Result<(), StoreError> {
        let conn = self.conn().await?;

        conn.execute(
            r#"
            INSERT INTO relayed_messages (id, room_id, sender_id, payload, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
            &[
                &Uuid::new_v4(),
                &message.room_id,
                &message.sender_id,
                &message.payload,
                &message.created_at,
            ],
        )
        .await?;

        Ok(())
    }
}
