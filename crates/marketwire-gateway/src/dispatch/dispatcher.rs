use std::sync::Arc;

use marketwire_core::protocol::ClientEvent;

use crate::dispatch::lifecycle::Lifecycle;
use crate::obs::GatewayMetrics;
use crate::presence::{PresenceRegistry, Role};
use crate::realtime::ConnectionHub;
use crate::relay::{MessageRouter, RouteOutcome};

/// Applies decoded inbound events to the registry and the relay.
///
/// Nothing here returns an error to the peer: duplicates, admin takeovers and
/// undeliverable messages are all normal outcomes.
pub struct Dispatcher {
    hub: Arc<ConnectionHub>,
    registry: Arc<PresenceRegistry>,
    router: MessageRouter,
    metrics: Arc<GatewayMetrics>,
}

impl Dispatcher {
    pub fn new(
        hub: Arc<ConnectionHub>,
        registry: Arc<PresenceRegistry>,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        let router = MessageRouter::new(Arc::clone(&registry), Arc::clone(&hub), Arc::clone(&metrics));
        Self {
            hub,
            registry,
            router,
            metrics,
        }
    }

    /// Handle one inbound event. Returns the relay outcome for directed
    /// messages, `None` for registrations and for closed links.
    pub fn dispatch(&self, link: &mut Lifecycle, ev: ClientEvent) -> Option<RouteOutcome> {
        if !link.is_open() {
            tracing::debug!(conn = %link.conn(), event = ev.name(), "event after disconnect ignored");
            return None;
        }
        let conn = link.conn();

        match ev {
            ClientEvent::AddUser { customer_id, user_info } => {
                let inserted = self.registry.register_customer(&customer_id, conn, user_info);
                self.count_registration(Role::Customer, if inserted { "inserted" } else { "duplicate" });
                if inserted {
                    tracing::info!(%conn, customer_id = %customer_id, "customer online");
                    link.registered(Role::Customer);
                } else {
                    tracing::debug!(%conn, customer_id = %customer_id, "customer already registered");
                }
                None
            }
            ClientEvent::AddSeller { seller_id, user_info } => {
                let inserted = self.registry.register_seller(&seller_id, conn, user_info);
                self.count_registration(Role::Seller, if inserted { "inserted" } else { "duplicate" });
                if inserted {
                    tracing::info!(%conn, seller_id = %seller_id, "seller online");
                    link.registered(Role::Seller);
                } else {
                    tracing::debug!(%conn, seller_id = %seller_id, "seller already registered");
                }
                None
            }
            ClientEvent::AddAdmin { admin_info } => {
                match self.registry.register_admin(admin_info, conn) {
                    Some(prev) => {
                        self.count_registration(Role::Admin, "replaced");
                        tracing::info!(%conn, displaced = %prev, "admin seat taken over");
                    }
                    None => {
                        self.count_registration(Role::Admin, "took_seat");
                        tracing::info!(%conn, "admin online");
                    }
                }
                link.registered(Role::Admin);
                None
            }
            ClientEvent::Direct { kind, msg } => Some(self.router.route(conn, kind, msg)),
        }
    }

    /// Transport is gone: drop the queue, clear presence, broadcast once.
    /// Safe to call more than once; only the first call has effects.
    pub fn disconnect(&self, link: &mut Lifecycle) {
        if !link.close() {
            return;
        }
        let conn = link.conn();
        self.hub.disconnect(conn);
        self.registry.disconnect(conn);
        tracing::info!(%conn, "connection closed");
    }

    fn count_registration(&self, role: Role, outcome: &str) {
        self.metrics
            .registrations
            .inc(&[("role", role.as_str()), ("outcome", outcome)]);
    }
}
