//! Shared application state for the marketwire gateway.
//!
//! Wires hub -> broadcaster -> registry -> dispatcher once at startup and
//! hands cheap clones to every connection task.

use std::sync::Arc;

use marketwire_core::error::Result;

use crate::config::GatewayConfig;
use crate::dispatch::Dispatcher;
use crate::obs::GatewayMetrics;
use crate::presence::{PresenceBroadcaster, PresenceRegistry};
use crate::realtime::ConnectionHub;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    hub: Arc<ConnectionHub>,
    registry: Arc<PresenceRegistry>,
    dispatcher: Arc<Dispatcher>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    metrics: Arc<GatewayMetrics>,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        cfg.validate()?;

        let metrics = Arc::new(GatewayMetrics::default());
        let hub = Arc::new(ConnectionHub::new());

        let broadcaster = PresenceBroadcaster::new(
            Arc::clone(&hub),
            Arc::clone(&metrics),
            cfg.presence.broadcast_admin_offline_on_any_disconnect,
        );
        let registry = Arc::new(PresenceRegistry::with_observer(Arc::new(broadcaster)));
        let dispatcher = Dispatcher::new(Arc::clone(&hub), Arc::clone(&registry), Arc::clone(&metrics));

        if !cfg.presence.broadcast_admin_offline_on_any_disconnect {
            tracing::info!("activeAdmin on disconnect reports the real admin state");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, metrics }),
            hub,
            registry,
            dispatcher: Arc::new(dispatcher),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn hub(&self) -> Arc<ConnectionHub> {
        Arc::clone(&self.hub)
    }

    pub fn registry(&self) -> Arc<PresenceRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.inner.metrics
    }

    pub fn set_draining(&self) {
        self.inner.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    /// Point-in-time gauges rendered alongside the counters.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        let (customers, sellers, admin_online) = self.registry.counts();
        vec![
            ("marketwire_presence_customers", customers as u64),
            ("marketwire_presence_sellers", sellers as u64),
            ("marketwire_presence_admin_online", u64::from(admin_online)),
            ("marketwire_hub_connections", self.hub.len() as u64),
        ]
    }
}
