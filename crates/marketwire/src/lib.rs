//! Top-level facade crate for marketwire.
//!
//! Re-exports the wire contracts and the gateway library so users can depend on a single crate.

pub mod core {
    pub use marketwire_core::*;
}

pub mod gateway {
    pub use marketwire_gateway::*;
}
