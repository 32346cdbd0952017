//! Wire protocol: JSON text envelopes carrying named events.
//!
//! Every frame is `{"v":1,"event":"<name>","data":<json>}`. Inbound frames are
//! decoded once into a [`ClientEvent`]; outbound events are modelled as
//! [`ServerEvent`] and serialized once per broadcast.
//!
//! Parsers are panic-free: malformed input is reported as `RelayError`.

pub mod envelope;
pub mod event;

pub use envelope::{Envelope, PROTOCOL_VERSION};
pub use event::{
    receiver_id, AdminStatus, ClientEvent, CustomerEntry, DirectKind, ErrorBody, OutboundFrame,
    SellerEntry, ServerEvent,
};
