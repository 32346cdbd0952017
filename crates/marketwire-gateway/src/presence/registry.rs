use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use serde_json::Value;

use marketwire_core::ConnId;

/// Actor role a connection can register as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Customer,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Seller => "seller",
            Role::Admin => "admin",
        }
    }
}

/// A registered customer or seller: identity, current connection, profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub conn: ConnId,
    pub profile: Value,
}

/// The single admin seat. `profile` never carries an `email` field.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminSlot {
    pub conn: ConnId,
    pub profile: Value,
}

/// Point-in-time copy of presence, customers and sellers in registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresenceSnapshot {
    pub customers: Vec<Session>,
    pub sellers: Vec<Session>,
    pub admin_online: bool,
}

/// What just happened to the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenceChange {
    /// `inserted == false` means the id was already present and nothing changed.
    Customer { id: String, inserted: bool },
    Seller { id: String, inserted: bool },
    /// `displaced` is the previous admin connection, if any.
    Admin { displaced: Option<ConnId> },
    Disconnect { conn: ConnId, was_admin: bool },
}

/// Notified synchronously after every registry mutation, under the registry
/// lock. Implementations must not call back into the registry.
pub trait PresenceObserver: Send + Sync {
    fn presence_changed(&self, change: &PresenceChange, snapshot: &PresenceSnapshot);
}

#[derive(Default)]
struct PresenceState {
    customers: IndexMap<String, Session>,
    sellers: IndexMap<String, Session>,
    admin: Option<AdminSlot>,
}

impl PresenceState {
    fn snapshot(&self) -> PresenceSnapshot {
        PresenceSnapshot {
            customers: self.customers.values().cloned().collect(),
            sellers: self.sellers.values().cloned().collect(),
            admin_online: self.admin.is_some(),
        }
    }
}

/// Presence registry:
/// - `customerId -> Session` (first registration wins)
/// - `sellerId -> Session` (first registration wins)
/// - one admin slot (last registration wins)
#[derive(Default)]
pub struct PresenceRegistry {
    state: Mutex<PresenceState>,
    observer: Option<Arc<dyn PresenceObserver>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(observer: Arc<dyn PresenceObserver>) -> Self {
        Self {
            state: Mutex::new(PresenceState::default()),
            observer: Some(observer),
        }
    }

    // State is plain data; a panic elsewhere cannot leave it half-written.
    fn lock(&self) -> MutexGuard<'_, PresenceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, state: &PresenceState, change: PresenceChange) {
        if let Some(obs) = &self.observer {
            obs.presence_changed(&change, &state.snapshot());
        }
    }

    /// Returns `false` when the id was already registered; the existing
    /// session is kept untouched.
    pub fn register_customer(&self, customer_id: &str, conn: ConnId, profile: Value) -> bool {
        let mut st = self.lock();
        let inserted = insert_first(&mut st.customers, customer_id, conn, profile);
        self.notify(
            &st,
            PresenceChange::Customer {
                id: customer_id.to_string(),
                inserted,
            },
        );
        inserted
    }

    pub fn register_seller(&self, seller_id: &str, conn: ConnId, profile: Value) -> bool {
        let mut st = self.lock();
        let inserted = insert_first(&mut st.sellers, seller_id, conn, profile);
        self.notify(
            &st,
            PresenceChange::Seller {
                id: seller_id.to_string(),
                inserted,
            },
        );
        inserted
    }

    /// Strips `email` and takes the admin seat, displacing any current holder
    /// without telling it. Returns the displaced connection.
    pub fn register_admin(&self, mut profile: Value, conn: ConnId) -> Option<ConnId> {
        if let Some(obj) = profile.as_object_mut() {
            obj.remove("email");
        }
        let mut st = self.lock();
        let displaced = st
            .admin
            .replace(AdminSlot { conn, profile })
            .map(|prev| prev.conn);
        self.notify(&st, PresenceChange::Admin { displaced });
        displaced
    }

    pub fn find_customer(&self, customer_id: &str) -> Option<Session> {
        self.lock().customers.get(customer_id).cloned()
    }

    pub fn find_seller(&self, seller_id: &str) -> Option<Session> {
        self.lock().sellers.get(seller_id).cloned()
    }

    pub fn admin(&self) -> Option<AdminSlot> {
        self.lock().admin.clone()
    }

    /// Drop every customer and seller session bound to `conn`.
    /// Does not notify; see [`PresenceRegistry::disconnect`].
    pub fn remove_by_connection(&self, conn: ConnId) -> usize {
        remove_sessions(&mut self.lock(), conn)
    }

    /// Clear the admin slot only if `conn` still holds it, so a late
    /// disconnect cannot evict a newer admin. Does not notify.
    pub fn remove_admin_by_connection(&self, conn: ConnId) -> bool {
        remove_admin(&mut self.lock(), conn)
    }

    /// Transport-level disconnect: both removals in one critical section,
    /// followed by exactly one notification.
    pub fn disconnect(&self, conn: ConnId) -> PresenceChange {
        let mut st = self.lock();
        remove_sessions(&mut st, conn);
        let was_admin = remove_admin(&mut st, conn);
        let change = PresenceChange::Disconnect { conn, was_admin };
        self.notify(&st, change.clone());
        change
    }

    pub fn snapshot(&self) -> PresenceSnapshot {
        self.lock().snapshot()
    }

    /// `(customers, sellers, admin_online)` without cloning sessions.
    pub fn counts(&self) -> (usize, usize, bool) {
        let st = self.lock();
        (st.customers.len(), st.sellers.len(), st.admin.is_some())
    }
}

fn insert_first(map: &mut IndexMap<String, Session>, id: &str, conn: ConnId, profile: Value) -> bool {
    if map.contains_key(id) {
        return false;
    }
    map.insert(
        id.to_string(),
        Session {
            id: id.to_string(),
            conn,
            profile,
        },
    );
    true
}

fn remove_sessions(st: &mut PresenceState, conn: ConnId) -> usize {
    let before = st.customers.len() + st.sellers.len();
    // retain keeps insertion order for the survivors
    st.customers.retain(|_, s| s.conn != conn);
    st.sellers.retain(|_, s| s.conn != conn);
    before - (st.customers.len() + st.sellers.len())
}

fn remove_admin(st: &mut PresenceState, conn: ConnId) -> bool {
    if st.admin.as_ref().is_some_and(|a| a.conn == conn) {
        st.admin = None;
        true
    } else {
        false
    }
}
