use std::sync::Arc;

use serde_json::Value;

use marketwire_core::protocol::{receiver_id, DirectKind};
use marketwire_core::ConnId;

use crate::obs::GatewayMetrics;
use crate::presence::PresenceRegistry;
use crate::realtime::{ConnectionHub, SendStatus};

/// Why a directed message was not delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// `receiverId` absent or not a string.
    MissingReceiver,
    /// No session for the receiver (or no admin seated).
    Offline,
    QueueFull,
    /// Resolved connection is already gone.
    Closed,
}

impl DropReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::MissingReceiver => "missing_receiver",
            DropReason::Offline => "offline",
            DropReason::QueueFull => "queue_full",
            DropReason::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Delivered(ConnId),
    Dropped(DropReason),
}

/// Resolves directed messages against the presence registry and unicasts them.
///
/// | inbound                        | target            | delivered as              |
/// |--------------------------------|-------------------|---------------------------|
/// | `send_seller_message`          | seller registry   | `seller_message`          |
/// | `send_customer_message`        | customer registry | `customer_message`        |
/// | `send_message_admin_to_seller` | seller registry   | `received_admin_message`  |
/// | `send_message_seller_to_admin` | admin slot        | `received_seller_message` |
pub struct MessageRouter {
    registry: Arc<PresenceRegistry>,
    hub: Arc<ConnectionHub>,
    metrics: Arc<GatewayMetrics>,
}

impl MessageRouter {
    pub fn new(
        registry: Arc<PresenceRegistry>,
        hub: Arc<ConnectionHub>,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            registry,
            hub,
            metrics,
        }
    }

    /// Current connection of the message's target, if any.
    pub fn resolve(&self, kind: DirectKind, msg: &Value) -> Result<ConnId, DropReason> {
        let session = match kind {
            DirectKind::SellerToAdmin => {
                return self
                    .registry
                    .admin()
                    .map(|a| a.conn)
                    .ok_or(DropReason::Offline);
            }
            DirectKind::SellerToCustomer => {
                let id = receiver_id(msg).ok_or(DropReason::MissingReceiver)?;
                self.registry.find_customer(id)
            }
            DirectKind::CustomerToSeller | DirectKind::AdminToSeller => {
                let id = receiver_id(msg).ok_or(DropReason::MissingReceiver)?;
                self.registry.find_seller(id)
            }
        };
        session.map(|s| s.conn).ok_or(DropReason::Offline)
    }

    /// Forward `msg` unchanged to its target. Never reports back to `from`.
    pub fn route(&self, from: ConnId, kind: DirectKind, msg: Value) -> RouteOutcome {
        let outcome = match self.resolve(kind, &msg) {
            Err(reason) => RouteOutcome::Dropped(reason),
            Ok(target) => match self.hub.unicast(target, &kind.deliver(msg)) {
                Ok(SendStatus::Queued) => RouteOutcome::Delivered(target),
                // registry still had it but the transport already let go
                Ok(SendStatus::Unknown) => RouteOutcome::Dropped(DropReason::Offline),
                Ok(SendStatus::QueueFull) => RouteOutcome::Dropped(DropReason::QueueFull),
                Ok(SendStatus::Closed) => RouteOutcome::Dropped(DropReason::Closed),
                Err(e) => {
                    tracing::warn!(%from, kind = kind.inbound_name(), error = %e, "relay encode failed");
                    RouteOutcome::Dropped(DropReason::Closed)
                }
            },
        };

        let label = match outcome {
            RouteOutcome::Delivered(to) => {
                tracing::debug!(%from, %to, kind = kind.inbound_name(), "relayed");
                "delivered"
            }
            RouteOutcome::Dropped(reason) => {
                tracing::debug!(%from, kind = kind.inbound_name(), reason = reason.as_str(), "relay dropped");
                reason.as_str()
            }
        };
        self.metrics
            .relay_messages
            .inc(&[("kind", kind.inbound_name()), ("outcome", label)]);
        outcome
    }
}
