//! Dispatcher module exports.
//!
//! Re-exports the dispatcher and the per-connection lifecycle so the transport
//! can depend on this module directly.

pub mod dispatcher;
pub mod lifecycle;

pub use dispatcher::Dispatcher;
pub use lifecycle::{Lifecycle, LinkState, Roles};
