use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};

use marketwire_core::error::Result;
use marketwire_core::protocol::ServerEvent;
use marketwire_core::ConnId;

use crate::realtime::types::PreparedMsg;

/// One connection's outbound queue sender.
#[derive(Clone)]
pub struct Connection {
    pub tx: mpsc::Sender<Message>,
}

/// Result of a single non-blocking enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    Queued,
    /// No live connection with that handle.
    Unknown,
    /// The peer is not draining its queue fast enough.
    QueueFull,
    /// The writer side has already gone away.
    Closed,
}

/// Connection hub: `ConnId -> Connection`.
///
/// All egress is `try_send`: a slow or vanished peer loses messages instead of
/// stalling delivery to everybody else.
pub struct ConnectionHub {
    conns: DashMap<ConnId, Connection>,
    seq: AtomicU64,
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self {
            conns: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    /// Register a live connection and hand out a fresh, never-reused handle.
    pub fn connect(&self, conn: Connection) -> ConnId {
        let id = ConnId::new(self.seq.fetch_add(1, Ordering::Relaxed));
        self.conns.insert(id, conn);
        id
    }

    /// Convenience for callers that want the queue created for them.
    pub fn open(&self, capacity: usize) -> (ConnId, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (self.connect(Connection { tx }), rx)
    }

    pub fn disconnect(&self, id: ConnId) -> Option<Connection> {
        self.conns.remove(&id).map(|(_, c)| c)
    }

    pub fn contains(&self, id: ConnId) -> bool {
        self.conns.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    pub fn unicast(&self, id: ConnId, ev: &ServerEvent) -> Result<SendStatus> {
        let prepared = PreparedMsg::prepare(ev)?;
        Ok(self.unicast_prepared(id, &prepared))
    }

    pub fn unicast_prepared(&self, id: ConnId, msg: &PreparedMsg) -> SendStatus {
        let Some(conn) = self.conns.get(&id).map(|r| r.value().clone()) else {
            return SendStatus::Unknown;
        };
        match conn.tx.try_send(msg.to_ws_message()) {
            Ok(()) => SendStatus::Queued,
            Err(TrySendError::Full(_)) => SendStatus::QueueFull,
            Err(TrySendError::Closed(_)) => SendStatus::Closed,
        }
    }

    /// Lossy broadcast to every live connection. Returns how many queues
    /// accepted the message.
    pub fn broadcast(&self, ev: &ServerEvent) -> Result<usize> {
        let prepared = PreparedMsg::prepare(ev)?;
        let mut queued = 0;
        for entry in self.conns.iter() {
            if entry.value().tx.try_send(prepared.to_ws_message()).is_ok() {
                queued += 1;
            }
        }
        Ok(queued)
    }
}
