use marketwire_core::ConnId;

use crate::presence::Role;

/// Roles a connection has registered as so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Roles {
    pub customer: bool,
    pub seller: bool,
    pub admin: bool,
}

impl Roles {
    fn set(&mut self, role: Role) {
        match role {
            Role::Customer => self.customer = true,
            Role::Seller => self.seller = true,
            Role::Admin => self.admin = true,
        }
    }

    pub fn has(&self, role: Role) -> bool {
        match role {
            Role::Customer => self.customer,
            Role::Seller => self.seller,
            Role::Admin => self.admin,
        }
    }
}

/// `Unregistered -> Registered(roles) -> Disconnected`; the last is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Unregistered,
    Registered(Roles),
    Disconnected,
}

/// Per-connection state machine, owned by the connection's task.
#[derive(Debug)]
pub struct Lifecycle {
    conn: ConnId,
    state: LinkState,
}

impl Lifecycle {
    pub fn new(conn: ConnId) -> Self {
        Self {
            conn,
            state: LinkState::Unregistered,
        }
    }

    pub fn conn(&self) -> ConnId {
        self.conn
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != LinkState::Disconnected
    }

    /// Record a registration. Ignored once disconnected.
    pub fn registered(&mut self, role: Role) {
        let mut roles = match self.state {
            LinkState::Unregistered => Roles::default(),
            LinkState::Registered(r) => r,
            LinkState::Disconnected => return,
        };
        roles.set(role);
        self.state = LinkState::Registered(roles);
    }

    /// Move to `Disconnected`. Returns `true` only on the first call.
    pub fn close(&mut self) -> bool {
        if self.state == LinkState::Disconnected {
            return false;
        }
        self.state = LinkState::Disconnected;
        true
    }
}
