use std::sync::Arc;

use marketwire_core::protocol::{AdminStatus, CustomerEntry, SellerEntry, ServerEvent};

use crate::obs::GatewayMetrics;
use crate::presence::registry::{PresenceChange, PresenceObserver, PresenceSnapshot};
use crate::realtime::ConnectionHub;

/// Publishes full presence snapshots to every live connection.
///
/// Each change produces `activeSeller`, `activeCustomer` and `activeAdmin`,
/// always whole lists, so clients never reconcile deltas.
pub struct PresenceBroadcaster {
    hub: Arc<ConnectionHub>,
    metrics: Arc<GatewayMetrics>,
    admin_offline_on_any_disconnect: bool,
}

impl PresenceBroadcaster {
    pub fn new(
        hub: Arc<ConnectionHub>,
        metrics: Arc<GatewayMetrics>,
        admin_offline_on_any_disconnect: bool,
    ) -> Self {
        Self {
            hub,
            metrics,
            admin_offline_on_any_disconnect,
        }
    }

    /// Admin flag to publish for this change.
    ///
    /// With `admin_offline_on_any_disconnect` every disconnect reports the
    /// admin offline, even when the admin's own connection is still up.
    pub fn admin_status(&self, change: &PresenceChange, snapshot: &PresenceSnapshot) -> bool {
        match change {
            PresenceChange::Disconnect { .. } if self.admin_offline_on_any_disconnect => false,
            _ => snapshot.admin_online,
        }
    }

    /// The three events for one change, in emit order.
    pub fn events(&self, change: &PresenceChange, snapshot: &PresenceSnapshot) -> [ServerEvent; 3] {
        let sellers = snapshot
            .sellers
            .iter()
            .map(|s| SellerEntry {
                seller_id: s.id.clone(),
                connection_id: s.conn,
                user_info: s.profile.clone(),
            })
            .collect();
        let customers = snapshot
            .customers
            .iter()
            .map(|s| CustomerEntry {
                customer_id: s.id.clone(),
                connection_id: s.conn,
                user_info: s.profile.clone(),
            })
            .collect();

        [
            ServerEvent::ActiveSeller(sellers),
            ServerEvent::ActiveCustomer(customers),
            ServerEvent::ActiveAdmin(AdminStatus {
                status: self.admin_status(change, snapshot),
            }),
        ]
    }
}

impl PresenceObserver for PresenceBroadcaster {
    fn presence_changed(&self, change: &PresenceChange, snapshot: &PresenceSnapshot) {
        for ev in self.events(change, snapshot) {
            match self.hub.broadcast(&ev) {
                Ok(queued) => {
                    self.metrics.presence_broadcasts.inc(&[("event", ev.name())]);
                    tracing::trace!(event = ev.name(), queued, "presence broadcast");
                }
                Err(e) => tracing::warn!(event = ev.name(), error = %e, "presence broadcast failed"),
            }
        }
    }
}
