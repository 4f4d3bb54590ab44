//! Pairing-code rendezvous and realtime room relay between desktop and
//! mobile clients.
//!
//! A desktop client fetches a short-lived four-digit code over HTTP and
//! shows it on screen. A mobile client types the code in, gets assigned
//! a display name, and both sides meet in a websocket room where
//! payloads are relayed between members without inspection.

pub mod config;
pub mod error;
pub mod http;
pub mod pairing;
pub mod relay;
pub mod rooms;
pub mod server;
pub mod store;

pub use error::{Error, Result};
