//! Realtime relay between room members.
//!
//! Once paired over HTTP, desktop and mobile clients open websockets,
//! join their shared room, and push opaque payloads at each other. The
//! server fans frames out and keeps a best-effort history log; it never
//! inspects payloads.

mod engine;
mod protocol;
mod socket;

pub use engine::RelayEngine;
pub use protocol::{ClientEvent, ServerEvent};
pub use socket::routes;
