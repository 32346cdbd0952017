//! Transport layer (WebSocket).
//!
//! Exposes the WS upgrade handler and the codec that decodes frames once
//! before they reach the dispatcher.

pub mod codec;
pub mod idle;
pub mod ws;
