//! Egress side of the gateway: live connections and their outbound queues.
//!
//! The hub is the transport adapter the presence and relay layers talk to.
//! It knows nothing about roles; it only maps connection handles to queues.

pub mod hub;
pub mod types;

pub use hub::{Connection, ConnectionHub, SendStatus};
pub use types::PreparedMsg;
