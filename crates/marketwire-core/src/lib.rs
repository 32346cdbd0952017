//! marketwire core: transport-agnostic wire contracts and error types.
//!
//! This crate defines the event vocabulary spoken between marketplace peers
//! (customers, sellers, the admin) and the relay gateway, plus the connection
//! handle type and the shared error surface. It carries no transport or
//! runtime dependencies so tests and client tooling can reuse it directly.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `RelayError`/`Result` so malformed peer
//! traffic never takes the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod ids;
pub mod protocol;

/// Shared result type.
pub use error::{Result, RelayError};
pub use ids::ConnId;
