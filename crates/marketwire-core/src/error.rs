//! Shared error type across marketwire crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed frame.
    BadRequest,
    /// Frame exceeds the configured size limit.
    PayloadTooLarge,
    /// Unsupported protocol version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON `error` events.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Unified error type used by core and gateway.
///
/// Routing misses and duplicate registrations are deliberately absent: the
/// relay treats them as normal outcomes, not failures.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("payload too large: {size} > {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u32),
    #[error("internal: {0}")]
    Internal(String),
}

impl RelayError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            RelayError::BadRequest(_) => ClientCode::BadRequest,
            RelayError::PayloadTooLarge { .. } => ClientCode::PayloadTooLarge,
            RelayError::UnsupportedVersion(_) => ClientCode::UnsupportedVersion,
            RelayError::Internal(_) => ClientCode::Internal,
        }
    }
}
