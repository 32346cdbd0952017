//! Presence: who is connected, in which role, and who gets told about it.
//!
//! The registry owns all session state behind one mutex and reports every
//! mutation to a [`PresenceObserver`]. The broadcaster is the production
//! observer; it turns each change into full-snapshot broadcasts.

pub mod broadcaster;
pub mod registry;

pub use broadcaster::PresenceBroadcaster;
pub use registry::{
    AdminSlot, PresenceChange, PresenceObserver, PresenceRegistry, PresenceSnapshot, Role, Session,
};
