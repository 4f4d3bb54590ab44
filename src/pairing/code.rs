//! Code generation and salted hashing.
//!
//! Codes are four decimal digits, easy to read off a screen and type on
//! a phone. Each code is stored as an HMAC-SHA256 digest keyed by a
//! random per-code salt, so a leaked store does not leak live codes.

use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const CODE_MIN: u32 = 1000;
const CODE_MAX: u32 = 9999;
const SALT_LEN: usize = 16;

/// Generate a random four-digit pairing code.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(CODE_MIN..=CODE_MAX).to_string()
}

/// Salted digest of a pairing code, both halves hex-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeHash {
    pub salt: String,
    pub digest: String,
}

impl CodeHash {
    /// Hash a code under a fresh random salt.
    pub fn new(code: &str) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill(&mut salt[..]);

        let digest = compute_digest(&salt, code);
        Self {
            salt: hex::encode(salt),
            digest,
        }
    }

    /// Whether `candidate` hashes to this digest under the stored salt.
    ///
    /// The digest comparison is constant-time so response latency does
    /// not narrow the candidate space.
    pub fn matches(&self, candidate: &str) -> bool {
        let Ok(salt) = hex::decode(&self.salt) else {
            return false;
        };

        let recomputed = compute_digest(&salt, candidate);
        bool::from(recomputed.as_bytes().ct_eq(self.digest.as_bytes()))
    }
}

fn compute_digest(salt: &[u8], code: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(salt).expect("HMAC key can be any length");
    mac.update(code.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
