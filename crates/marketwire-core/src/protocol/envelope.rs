//! Inbound envelope (JSON text frame).
//!
//! `data` is kept as `RawValue` so the event decoder parses it exactly once,
//! into the shape the named event expects.

use serde::Deserialize;
use serde_json::value::RawValue;

use crate::error::{RelayError, Result};

/// Only supported protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Inbound envelope (Text frame).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    /// Protocol version; must equal [`PROTOCOL_VERSION`].
    pub v: u32,
    /// Event name (e.g., "add_user").
    pub event: String,
    /// Optional payload, stored as raw JSON (lazy parsing).
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
}

impl Envelope {
    /// Parse and version-check a text frame.
    pub fn parse(s: &str) -> Result<Self> {
        let env: Envelope = serde_json::from_str(s)
            .map_err(|e| RelayError::BadRequest(format!("invalid envelope json: {e}")))?;
        if env.v != u32::from(PROTOCOL_VERSION) {
            return Err(RelayError::UnsupportedVersion(env.v));
        }
        Ok(env)
    }

    /// Raw payload text, or an error naming the event that needed it.
    pub fn require_data(&self) -> Result<&str> {
        self.data
            .as_deref()
            .map(RawValue::get)
            .ok_or_else(|| RelayError::BadRequest(format!("{} requires data", self.event)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_future_version() {
        let err = Envelope::parse(r#"{"v":2,"event":"add_user"}"#).unwrap_err();
        assert_eq!(err.client_code().as_str(), "UNSUPPORTED_VERSION");
    }

    #[test]
    fn out_of_range_version_is_unsupported_not_malformed() {
        let err = Envelope::parse(r#"{"v":300,"event":"add_user"}"#).unwrap_err();
        assert_eq!(err.client_code().as_str(), "UNSUPPORTED_VERSION");
        assert!(err.to_string().contains("300"));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = Envelope::parse(r#"{"v":1,"event":"add_user","room":"x"}"#).unwrap_err();
        assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
    }

    #[test]
    fn missing_data_names_the_event() {
        let env = Envelope::parse(r#"{"v":1,"event":"add_admin"}"#).unwrap();
        let err = env.require_data().unwrap_err();
        assert!(err.to_string().contains("add_admin"));
    }
}
