//! Pairing codes for linking a mobile client to a desktop session.
//!
//! A desktop client asks for a four-digit code and a fresh room id. The
//! code is stored salted and hashed, never in the clear, and survives
//! for a short TTL. A mobile client that presents the code within the
//! TTL consumes it, gets a generated display name, and lands in the
//! desktop's room.

mod code;
mod name;
mod service;

pub use code::{generate_code, CodeHash};
pub use name::allocate_name;
pub use service::{GeneratedCode, PairingService, VerifiedPairing, DEFAULT_CODE_TTL_SECS};
