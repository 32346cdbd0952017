//! Point-to-point relay between registered actors.
//!
//! Delivery is best-effort and at-most-once: a target that is not registered
//! right now simply does not get the message.

pub mod router;

pub use router::{DropReason, MessageRouter, RouteOutcome};
