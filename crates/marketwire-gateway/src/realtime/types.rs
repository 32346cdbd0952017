use axum::extract::ws::Message;

use marketwire_core::error::Result;
use marketwire_core::protocol::ServerEvent;

/// Prepared message cached for broadcasting (serialize once, send N times).
#[derive(Debug, Clone)]
pub struct PreparedMsg {
    text: String,
}

impl PreparedMsg {
    pub fn prepare(ev: &ServerEvent) -> Result<Self> {
        Ok(Self { text: ev.encode()? })
    }

    /// Convert to axum::ws::Message for transport.
    pub fn to_ws_message(&self) -> Message {
        Message::Text(self.text.clone())
    }
}
