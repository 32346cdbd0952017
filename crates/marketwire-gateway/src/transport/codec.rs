//! Decode-once codec for the transport layer.
//!
//! - Text frames => `ClientEvent` (size-checked before parsing)
//! - Binary frames => rejected; the protocol is JSON-only
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message;
use marketwire_core::{
    error::{RelayError, Result},
    protocol::ClientEvent,
};

#[derive(Debug)]
pub enum Inbound {
    Event(ClientEvent),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

/// Cheap frame length, computed before any parsing.
pub fn frame_len(msg: &Message) -> usize {
    match msg {
        Message::Text(s) => s.len(),
        Message::Binary(b) => b.len(),
        Message::Ping(v) => v.len(),
        Message::Pong(v) => v.len(),
        Message::Close(_) => 0,
    }
}

pub fn decode(msg: Message, max_frame_bytes: usize) -> Result<Inbound> {
    let size = frame_len(&msg);
    if size > max_frame_bytes {
        return Err(RelayError::PayloadTooLarge {
            size,
            limit: max_frame_bytes,
        });
    }
    match msg {
        Message::Text(s) => Ok(Inbound::Event(ClientEvent::decode(&s)?)),
        Message::Binary(_) => Err(RelayError::BadRequest(
            "binary frames are not supported".into(),
        )),
        Message::Ping(v) => Ok(Inbound::Ping(v)),
        Message::Pong(v) => Ok(Inbound::Pong(v)),
        Message::Close(_) => Ok(Inbound::Close),
    }
}
