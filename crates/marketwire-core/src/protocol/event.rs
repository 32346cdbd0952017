//! Event vocabulary: what peers send (`ClientEvent`) and what the gateway
//! emits (`ServerEvent`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RelayError, Result};
use crate::ids::ConnId;
use crate::protocol::envelope::{Envelope, PROTOCOL_VERSION};

/// The four directed message kinds the relay forwards point-to-point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectKind {
    /// `send_seller_message`: customer writes to a seller.
    CustomerToSeller,
    /// `send_customer_message`: seller writes to a customer.
    SellerToCustomer,
    /// `send_message_admin_to_seller`.
    AdminToSeller,
    /// `send_message_seller_to_admin`.
    SellerToAdmin,
}

impl DirectKind {
    pub const ALL: [DirectKind; 4] = [
        DirectKind::CustomerToSeller,
        DirectKind::SellerToCustomer,
        DirectKind::AdminToSeller,
        DirectKind::SellerToAdmin,
    ];

    /// Inbound event name that carries this kind.
    pub fn inbound_name(self) -> &'static str {
        match self {
            DirectKind::CustomerToSeller => "send_seller_message",
            DirectKind::SellerToCustomer => "send_customer_message",
            DirectKind::AdminToSeller => "send_message_admin_to_seller",
            DirectKind::SellerToAdmin => "send_message_seller_to_admin",
        }
    }

    /// Outbound event name the target receives.
    pub fn outbound_name(self) -> &'static str {
        match self {
            DirectKind::CustomerToSeller => "seller_message",
            DirectKind::SellerToCustomer => "customer_message",
            DirectKind::AdminToSeller => "received_admin_message",
            DirectKind::SellerToAdmin => "received_seller_message",
        }
    }

    pub fn from_inbound(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.inbound_name() == name)
    }

    /// Wrap a payload into the outbound event for this kind.
    pub fn deliver(self, msg: Value) -> ServerEvent {
        match self {
            DirectKind::CustomerToSeller => ServerEvent::SellerMessage(msg),
            DirectKind::SellerToCustomer => ServerEvent::CustomerMessage(msg),
            DirectKind::AdminToSeller => ServerEvent::ReceivedAdminMessage(msg),
            DirectKind::SellerToAdmin => ServerEvent::ReceivedSellerMessage(msg),
        }
    }
}

/// Decoded inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// `add_user`: register as customer.
    AddUser { customer_id: String, user_info: Value },
    /// `add_seller`: register as seller.
    AddSeller { seller_id: String, user_info: Value },
    /// `add_admin`: register as the admin.
    AddAdmin { admin_info: Value },
    /// One of the four directed messages; `msg` is forwarded untouched.
    Direct { kind: DirectKind, msg: Value },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddUserData {
    customer_id: String,
    #[serde(default)]
    user_info: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddSellerData {
    seller_id: String,
    #[serde(default)]
    user_info: Value,
}

fn parse_data<'a, T: Deserialize<'a>>(env: &'a Envelope) -> Result<T> {
    serde_json::from_str(env.require_data()?)
        .map_err(|e| RelayError::BadRequest(format!("{} invalid data: {e}", env.event)))
}

// Directed messages never fail on a missing payload; the router drops them
// for lack of a receiver instead.
fn direct_payload(env: &Envelope) -> Result<Value> {
    match env.data.as_deref() {
        Some(raw) => serde_json::from_str(raw.get())
            .map_err(|e| RelayError::BadRequest(format!("{} invalid data: {e}", env.event))),
        None => Ok(Value::Null),
    }
}

impl ClientEvent {
    /// Decode a raw text frame into an event.
    pub fn decode(text: &str) -> Result<Self> {
        let env = Envelope::parse(text)?;
        Self::from_envelope(&env)
    }

    pub fn from_envelope(env: &Envelope) -> Result<Self> {
        match env.event.as_str() {
            "add_user" => {
                let d: AddUserData = parse_data(env)?;
                Ok(ClientEvent::AddUser {
                    customer_id: d.customer_id,
                    user_info: d.user_info,
                })
            }
            "add_seller" => {
                let d: AddSellerData = parse_data(env)?;
                Ok(ClientEvent::AddSeller {
                    seller_id: d.seller_id,
                    user_info: d.user_info,
                })
            }
            "add_admin" => Ok(ClientEvent::AddAdmin {
                admin_info: parse_data(env)?,
            }),
            other => match DirectKind::from_inbound(other) {
                Some(kind) => Ok(ClientEvent::Direct {
                    kind,
                    msg: direct_payload(env)?,
                }),
                None => Err(RelayError::BadRequest(format!("unknown event: {other}"))),
            },
        }
    }

    /// Inbound event name, for logs and metrics labels.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::AddUser { .. } => "add_user",
            ClientEvent::AddSeller { .. } => "add_seller",
            ClientEvent::AddAdmin { .. } => "add_admin",
            ClientEvent::Direct { kind, .. } => kind.inbound_name(),
        }
    }
}

/// Target identifier of a directed message.
///
/// Reads `receiverId`, falling back to the `receverId` spelling older clients
/// send. Missing or non-string values yield `None`.
pub fn receiver_id(msg: &Value) -> Option<&str> {
    msg.get("receiverId")
        .or_else(|| msg.get("receverId"))
        .and_then(Value::as_str)
}

/// One connected customer as published in `activeCustomer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerEntry {
    pub customer_id: String,
    pub connection_id: ConnId,
    pub user_info: Value,
}

/// One connected seller as published in `activeSeller`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerEntry {
    pub seller_id: String,
    pub connection_id: ConnId,
    pub user_info: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStatus {
    pub status: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub msg: String,
}

impl From<&RelayError> for ErrorBody {
    fn from(e: &RelayError) -> Self {
        Self {
            code: e.client_code().as_str().to_string(),
            msg: e.to_string(),
        }
    }
}

/// Outbound event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "activeSeller")]
    ActiveSeller(Vec<SellerEntry>),
    #[serde(rename = "activeCustomer")]
    ActiveCustomer(Vec<CustomerEntry>),
    #[serde(rename = "activeAdmin")]
    ActiveAdmin(AdminStatus),
    #[serde(rename = "seller_message")]
    SellerMessage(Value),
    #[serde(rename = "customer_message")]
    CustomerMessage(Value),
    #[serde(rename = "received_admin_message")]
    ReceivedAdminMessage(Value),
    #[serde(rename = "received_seller_message")]
    ReceivedSellerMessage(Value),
    #[serde(rename = "error")]
    Error(ErrorBody),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::ActiveSeller(_) => "activeSeller",
            ServerEvent::ActiveCustomer(_) => "activeCustomer",
            ServerEvent::ActiveAdmin(_) => "activeAdmin",
            ServerEvent::SellerMessage(_) => "seller_message",
            ServerEvent::CustomerMessage(_) => "customer_message",
            ServerEvent::ReceivedAdminMessage(_) => "received_admin_message",
            ServerEvent::ReceivedSellerMessage(_) => "received_seller_message",
            ServerEvent::Error(_) => "error",
        }
    }

    /// Serialize into a versioned text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(&OutboundFrame {
            v: PROTOCOL_VERSION,
            event: self,
        })
        .map_err(|e| RelayError::Internal(format!("json encode failed: {e}")))
    }
}

/// Versioned wrapper written to the wire.
#[derive(Debug, Serialize)]
pub struct OutboundFrame<'a> {
    pub v: u8,
    #[serde(flatten)]
    pub event: &'a ServerEvent,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn direct_kinds_round_trip_by_inbound_name() {
        for kind in DirectKind::ALL {
            assert_eq!(DirectKind::from_inbound(kind.inbound_name()), Some(kind));
            assert_eq!(kind.deliver(Value::Null).name(), kind.outbound_name());
        }
        assert_eq!(DirectKind::from_inbound("add_user"), None);
    }

    #[test]
    fn receiver_id_prefers_canonical_spelling() {
        assert_eq!(receiver_id(&json!({"receiverId": "C1"})), Some("C1"));
        assert_eq!(receiver_id(&json!({"receverId": "C2"})), Some("C2"));
        assert_eq!(
            receiver_id(&json!({"receiverId": "C1", "receverId": "C2"})),
            Some("C1")
        );
        assert_eq!(receiver_id(&json!({"receiverId": 7})), None);
        assert_eq!(receiver_id(&json!("C1")), None);
        assert_eq!(receiver_id(&json!({})), None);
    }

    #[test]
    fn direct_message_without_data_decodes_with_null_payload() {
        let ev = ClientEvent::decode(r#"{"v":1,"event":"send_customer_message"}"#).unwrap();
        assert_eq!(
            ev,
            ClientEvent::Direct {
                kind: DirectKind::SellerToCustomer,
                msg: Value::Null,
            }
        );
        if let ClientEvent::Direct { msg, .. } = &ev {
            assert_eq!(receiver_id(msg), None);
        }
    }

    #[test]
    fn registration_without_data_is_rejected() {
        let err = ClientEvent::decode(r#"{"v":1,"event":"add_user"}"#).unwrap_err();
        assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
    }

    #[test]
    fn encodes_versioned_frame() {
        let ev = ServerEvent::ActiveAdmin(AdminStatus { status: true });
        let v: Value = serde_json::from_str(&ev.encode().unwrap()).unwrap();
        assert_eq!(v, json!({"v": 1, "event": "activeAdmin", "data": {"status": true}}));
    }

    #[test]
    fn encodes_presence_entries_in_camel_case() {
        let ev = ServerEvent::ActiveCustomer(vec![CustomerEntry {
            customer_id: "cust-1".into(),
            connection_id: ConnId::new(4),
            user_info: json!({"name": "Ann"}),
        }]);
        let v: Value = serde_json::from_str(&ev.encode().unwrap()).unwrap();
        assert_eq!(
            v["data"],
            json!([{"customerId": "cust-1", "connectionId": 4, "userInfo": {"name": "Ann"}}])
        );
    }
}
