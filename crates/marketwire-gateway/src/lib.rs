//! marketwire gateway library entry.
//!
//! This crate wires the WebSocket transport, the connection hub, the presence
//! registry and broadcaster, and the message relay into one gateway. It is
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod obs;
pub mod ops;
pub mod presence;
pub mod realtime;
pub mod relay;
pub mod router;
pub mod transport;
