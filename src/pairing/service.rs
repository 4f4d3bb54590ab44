//! Code issue and verification flow.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::PairingError;
use crate::store::{NewCode, NewUser, Store};

use super::{allocate_name, generate_code, CodeHash};

/// Default pairing code lifetime, in seconds.
pub const DEFAULT_CODE_TTL_SECS: u64 = 120;

/// Issued code handed back to the desktop client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    pub code: String,
    pub room_id: Uuid,
}

/// Successful verification handed back to the mobile client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPairing {
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
}

/// Issues pairing codes and verifies candidates against the store.
pub struct PairingService {
    store: Arc<dyn Store>,
    code_ttl: Duration,
}

impl PairingService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            code_ttl: Duration::seconds(DEFAULT_CODE_TTL_SECS as i64),
        }
    }

    /// Override the code lifetime.
    pub fn with_code_ttl(mut self, ttl: Duration) -> Self {
        self.code_ttl = ttl;
        self
    }

    fn cutoff(&self) -> DateTime<Utc> {
        Utc::now() - self.code_ttl
    }

    /// Issue a fresh four-digit code. The stored row id doubles as the
    /// room id the desktop client will join.
    pub async fn generate_code(&self) -> Result<GeneratedCode, PairingError> {
        let code = generate_code();
        let hash = CodeHash::new(&code);

        let room_id = self
            .store
            .insert_code(NewCode {
                hash,
                created_at: Utc::now(),
            })
            .await?;

        info!(room_id = %room_id, "Issued pairing code");
        Ok(GeneratedCode { code, room_id })
    }

    /// Verify a candidate code from a mobile client.
    ///
    /// A matching live code is consumed so it cannot be redeemed twice.
    /// Wrong, expired, and already-consumed codes all come back as
    /// [`PairingError::InvalidCode`] so a prober learns nothing from
    /// the failure mode.
    pub async fn verify_code(
        &self,
        candidate: &str,
        device_id: Option<String>,
    ) -> Result<VerifiedPairing, PairingError> {
        if candidate.is_empty() {
            return Err(PairingError::MissingCode);
        }

        let cutoff = self.cutoff();
        for record in self.store.live_codes(cutoff).await? {
            if !record.hash.matches(candidate) {
                continue;
            }

            // A concurrent verify may have consumed this code between
            // the scan and here; the loser keeps scanning.
            if !self.store.claim_code(record.id, cutoff).await? {
                continue;
            }

            let display_name = allocate_name();
            let user_id = self
                .store
                .insert_user(NewUser {
                    display_name: display_name.clone(),
                    device_id: device_id.clone(),
                    room_id: record.id,
                    created_at: Utc::now(),
                })
                .await
                .map_err(PairingError::UserCreation)?;

            info!(
                room_id = %record.id,
                user_id = %user_id,
                name = %display_name,
                "Mobile client paired"
            );

            return Ok(VerifiedPairing {
                room_id: record.id,
                user_id,
                display_name,
            });
        }

        Err(PairingError::InvalidCode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service_with_store() -> (PairingService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (PairingService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_generate_then_verify() {
        let (service, store) = service_with_store();

        let issued = service.generate_code().await.unwrap();
        assert_eq!(issued.code.len(), 4);

        let pairing = service.verify_code(&issued.code, None).await.unwrap();
        assert_eq!(pairing.room_id, issued.room_id);
        assert_eq!(pairing.display_name.len(), 4);
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_verify_records_device_id() {
        let (service, store) = service_with_store();

        let issued = service.generate_code().await.unwrap();
        service
            .verify_code(&issued.code, Some("mobile-7".to_string()))
            .await
            .unwrap();

        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_verify_empty_code_is_missing() {
        let (service, _) = service_with_store();
        let err = service.verify_code("", None).await.unwrap_err();
        assert!(matches!(err, PairingError::MissingCode));
    }

    #[tokio::test]
    async fn test_verify_wrong_code_is_invalid() {
        let (service, _) = service_with_store();
        service.generate_code().await.unwrap();

        let err = service.verify_code("0000", None).await.unwrap_err();
        assert!(matches!(err, PairingError::InvalidCode));
    }

    #[tokio::test]
    async fn test_code_is_single_use() {
        let (service, store) = service_with_store();
        let issued = service.generate_code().await.unwrap();

        service.verify_code(&issued.code, None).await.unwrap();
        let err = service.verify_code(&issued.code, None).await.unwrap_err();

        assert!(matches!(err, PairingError::InvalidCode));
        assert_eq!(store.user_count().await, 1);
        assert_eq!(store.code_count().await, 0);
    }

    #[tokio::test]
    async fn test_expired_code_is_invalid() {
        let (service, store) = {
            let store = Arc::new(MemoryStore::new());
            let service = PairingService::new(store.clone()).with_code_ttl(Duration::zero());
            (service, store)
        };

        let issued = service.generate_code().await.unwrap();
        let err = service.verify_code(&issued.code, None).await.unwrap_err();

        assert!(matches!(err, PairingError::InvalidCode));
        assert_eq!(store.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_verify_claims_once() {
        let (service, store) = service_with_store();
        let issued = service.generate_code().await.unwrap();

        let (a, b) = tokio::join!(
            service.verify_code(&issued.code, None),
            service.verify_code(&issued.code, None),
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert_eq!(store.user_count().await, 1);

        let failure = if a.is_err() { a } else { b };
        assert!(matches!(failure.unwrap_err(), PairingError::InvalidCode));
    }

    #[tokio::test]
    async fn test_multiple_codes_verify_independently() {
        let (service, store) = service_with_store();

        let first = service.generate_code().await.unwrap();
        let second = service.generate_code().await.unwrap();
        assert_ne!(first.room_id, second.room_id);

        // Four-digit codes can collide across rooms; the room mapping
        // is only deterministic when they differ.
        if first.code != second.code {
            let p2 = service.verify_code(&second.code, None).await.unwrap();
            assert_eq!(p2.room_id, second.room_id);

            let p1 = service.verify_code(&first.code, None).await.unwrap();
            assert_eq!(p1.room_id, first.room_id);

            assert_eq!(store.user_count().await, 2);
        }
    }
}
