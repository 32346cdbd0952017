//! Minimal metrics registry for the gateway.
//!
//! Labels are flattened into sorted key vectors so rendering order within a
//! family does not depend on insertion order of label pairs.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_key(labels: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut key: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn series(name: &str, key: &[(String, String)]) -> String {
    if key.is_empty() {
        return name.to_string();
    }
    let label_str = key
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",");
    format!("{name}{{{label_str}}}")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for one label set (0 if never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{} {}", series(name, r.key()), val);
        }
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<Vec<(String, String)>, AtomicI64>,
}

impl GaugeVec {
    pub fn inc(&self, labels: &[(&str, &str)]) { self.add(labels, 1); }
    pub fn dec(&self, labels: &[(&str, &str)]) { self.add(labels, -1); }

    /// Add an arbitrary signed delta.
    pub fn add(&self, labels: &[(&str, &str)], v: i64) {
        let gauge = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicI64::new(0));
        gauge.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> i64 {
        self.map
            .get(&label_key(labels))
            .map(|g| g.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} gauge", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{} {}", series(name, r.key()), val);
        }
    }
}

#[derive(Default)]
pub struct GatewayMetrics {
    pub ws_upgrades: CounterVec,
    pub ws_active_connections: GaugeVec,
    /// labels: role, outcome (inserted | duplicate | replaced | took_seat)
    pub registrations: CounterVec,
    /// labels: kind, outcome (delivered | missing_receiver | offline | queue_full | closed)
    pub relay_messages: CounterVec,
    /// labels: event
    pub presence_broadcasts: CounterVec,
    /// labels: code
    pub decode_errors: CounterVec,
    draining: AtomicBool,
}

impl GatewayMetrics {
    pub fn set_draining(&self) { self.draining.store(true, Ordering::Relaxed); }
    pub fn is_draining(&self) -> bool { self.draining.load(Ordering::Relaxed) }

    /// Render all registered metrics plus any extra gauge lines provided by callers.
    pub fn render(&self, extra: &[(&str, u64)]) -> String {
        let mut out = String::new();
        self.ws_upgrades.render("marketwire_ws_upgrades_total", &mut out);
        self.ws_active_connections.render("marketwire_ws_connections_active", &mut out);
        self.registrations.render("marketwire_registrations_total", &mut out);
        self.relay_messages.render("marketwire_relay_messages_total", &mut out);
        self.presence_broadcasts.render("marketwire_presence_broadcasts_total", &mut out);
        self.decode_errors.render("marketwire_decode_errors_total", &mut out);

        let _ = writeln!(out, "# TYPE marketwire_draining gauge\nmarketwire_draining {}", if self.is_draining() { 1 } else { 0 });
        for (k, v) in extra {
            let _ = writeln!(out, "# TYPE {k} gauge\n{k} {v}");
        }
        out
    }
}
