//! End-to-end presence/relay scenarios driven through the dispatcher with
//! real hub queues (no sockets).

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::extract::ws::Message;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use marketwire_core::protocol::{ClientEvent, DirectKind};
use marketwire_gateway::app_state::AppState;
use marketwire_gateway::config::GatewayConfig;
use marketwire_gateway::dispatch::Lifecycle;
use marketwire_gateway::relay::{DropReason, RouteOutcome};

struct Peer {
    link: Lifecycle,
    rx: mpsc::Receiver<Message>,
}

impl Peer {
    fn connect(app: &AppState) -> Self {
        let (conn, rx) = app.hub().open(64);
        Self {
            link: Lifecycle::new(conn),
            rx,
        }
    }

    fn send(&mut self, app: &AppState, ev: ClientEvent) -> Option<RouteOutcome> {
        app.dispatcher().dispatch(&mut self.link, ev)
    }

    fn frame(&mut self, app: &AppState, text: &str) -> Option<RouteOutcome> {
        let ev = ClientEvent::decode(text).unwrap();
        self.send(app, ev)
    }

    fn disconnect(&mut self, app: &AppState) {
        app.dispatcher().disconnect(&mut self.link);
    }

    fn drain(&mut self) -> Vec<Value> {
        let mut out = Vec::new();
        while let Ok(Message::Text(s)) = self.rx.try_recv() {
            out.push(serde_json::from_str(&s).unwrap());
        }
        out
    }
}

fn app_with(flag: bool) -> AppState {
    let mut cfg = GatewayConfig::default();
    cfg.presence.broadcast_admin_offline_on_any_disconnect = flag;
    AppState::new(cfg).unwrap()
}

fn last<'a>(evs: &'a [Value], name: &str) -> &'a Value {
    evs.iter()
        .rev()
        .find(|v| v["event"] == name)
        .unwrap_or_else(|| panic!("no {name} in {evs:?}"))
}

fn listed_ids(ev: &Value, key: &str) -> Vec<String> {
    ev["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e[key].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn customer_seller_round_trip_and_disconnect() {
    let app = app_with(true);
    let mut a = Peer::connect(&app);
    let mut b = Peer::connect(&app);

    a.frame(&app, r#"{"v":1,"event":"add_user","data":{"customerId":"cust-1","userInfo":{"name":"Ann"}}}"#);
    b.frame(&app, r#"{"v":1,"event":"add_seller","data":{"sellerId":"sell-1","userInfo":{"shop":"Bob's"}}}"#);

    for peer in [&mut a, &mut b] {
        let evs = peer.drain();
        assert_eq!(listed_ids(last(&evs, "activeCustomer"), "customerId"), ["cust-1"]);
        assert_eq!(listed_ids(last(&evs, "activeSeller"), "sellerId"), ["sell-1"]);
    }

    let payload = json!({"senderId": "sell-1", "receiverId": "cust-1", "message": "your order shipped"});
    let out = b.send(
        &app,
        ClientEvent::Direct {
            kind: DirectKind::SellerToCustomer,
            msg: payload.clone(),
        },
    );
    assert!(matches!(out, Some(RouteOutcome::Delivered(_))));

    let got = a.drain();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0]["event"], "customer_message");
    assert_eq!(got[0]["data"], payload);
    assert!(b.drain().is_empty(), "unicast must not echo to the sender");

    a.disconnect(&app);
    let evs = b.drain();
    assert_eq!(last(&evs, "activeCustomer")["data"], json!([]));
    assert_eq!(listed_ids(last(&evs, "activeSeller"), "sellerId"), ["sell-1"]);
}

#[test]
fn message_to_offline_customer_produces_no_traffic() {
    let app = app_with(true);
    let mut seller = Peer::connect(&app);
    let mut bystander = Peer::connect(&app);
    seller.send(
        &app,
        ClientEvent::AddSeller {
            seller_id: "S1".into(),
            user_info: Value::Null,
        },
    );
    seller.drain();
    bystander.drain();

    let out = seller.frame(
        &app,
        r#"{"v":1,"event":"send_customer_message","data":{"receiverId":"nobody","message":"hi"}}"#,
    );

    assert_eq!(out, Some(RouteOutcome::Dropped(DropReason::Offline)));
    assert!(seller.drain().is_empty());
    assert!(bystander.drain().is_empty());
}

#[test]
fn directed_message_without_data_is_dropped_silently() {
    let app = app_with(true);
    let mut seller = Peer::connect(&app);
    let mut customer = Peer::connect(&app);
    customer.send(&app, ClientEvent::AddUser { customer_id: "C1".into(), user_info: Value::Null });
    seller.drain();
    customer.drain();

    let out = seller.frame(&app, r#"{"v":1,"event":"send_customer_message"}"#);

    assert_eq!(out, Some(RouteOutcome::Dropped(DropReason::MissingReceiver)));
    assert!(seller.drain().is_empty(), "no error event goes back to the sender");
    assert!(customer.drain().is_empty());
    assert_eq!(
        app.metrics().relay_messages.get(&[
            ("kind", "send_customer_message"),
            ("outcome", "missing_receiver"),
        ]),
        1
    );
}

#[test]
fn admin_email_never_reaches_storage() {
    let app = app_with(true);
    let mut admin = Peer::connect(&app);
    admin.frame(&app, r#"{"v":1,"event":"add_admin","data":{"email":"a@x.com","name":"Admin"}}"#);

    let slot = app.registry().admin().unwrap();
    assert_eq!(slot.profile, json!({"name": "Admin"}));

    let evs = admin.drain();
    assert_eq!(last(&evs, "activeAdmin")["data"], json!({"status": true}));
}

#[test]
fn second_admin_takes_the_seat_and_stale_disconnect_is_harmless() {
    let app = app_with(false);
    let mut first = Peer::connect(&app);
    let mut second = Peer::connect(&app);
    let mut seller = Peer::connect(&app);

    first.send(&app, ClientEvent::AddAdmin { admin_info: json!({"name": "one"}) });
    second.send(&app, ClientEvent::AddAdmin { admin_info: json!({"name": "two"}) });
    seller.send(&app, ClientEvent::AddSeller { seller_id: "S1".into(), user_info: Value::Null });
    first.drain();
    second.drain();

    first.disconnect(&app);
    assert_eq!(app.registry().admin().unwrap().conn, second.link.conn());
    let evs = seller.drain();
    assert_eq!(last(&evs, "activeAdmin")["data"]["status"], true);
    // the disconnect broadcast reached the new admin too
    assert_eq!(last(&second.drain(), "activeAdmin")["data"]["status"], true);

    let out = seller.send(
        &app,
        ClientEvent::Direct {
            kind: DirectKind::SellerToAdmin,
            msg: json!({"message": "payout question"}),
        },
    );
    assert_eq!(out, Some(RouteOutcome::Delivered(second.link.conn())));
    let got = second.drain();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0]["event"], "received_seller_message");
}

#[test]
fn any_disconnect_reports_admin_offline_by_default() {
    let app = app_with(true);
    let mut admin = Peer::connect(&app);
    let mut customer = Peer::connect(&app);
    admin.send(&app, ClientEvent::AddAdmin { admin_info: json!({}) });
    customer.send(&app, ClientEvent::AddUser { customer_id: "C1".into(), user_info: Value::Null });
    admin.drain();

    customer.disconnect(&app);

    let evs = admin.drain();
    assert_eq!(last(&evs, "activeAdmin")["data"]["status"], false);
    // the seat itself is untouched
    assert!(app.registry().admin().is_some());
}

#[test]
fn admin_to_seller_uses_seller_registry() {
    let app = app_with(true);
    let mut admin = Peer::connect(&app);
    let mut seller = Peer::connect(&app);
    let mut customer = Peer::connect(&app);
    admin.send(&app, ClientEvent::AddAdmin { admin_info: json!({}) });
    seller.send(&app, ClientEvent::AddSeller { seller_id: "S1".into(), user_info: Value::Null });
    customer.send(&app, ClientEvent::AddUser { customer_id: "S1".into(), user_info: Value::Null });
    seller.drain();
    customer.drain();

    admin.frame(
        &app,
        r#"{"v":1,"event":"send_message_admin_to_seller","data":{"receiverId":"S1","message":"verified"}}"#,
    );

    let got = seller.drain();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0]["event"], "received_admin_message");
    assert!(customer.drain().is_empty());
}

#[test]
fn presence_gauges_follow_registry() {
    let app = app_with(true);
    let mut a = Peer::connect(&app);
    a.send(&app, ClientEvent::AddUser { customer_id: "C1".into(), user_info: Value::Null });

    let extra = app.metrics_extra();
    assert!(extra.contains(&("marketwire_presence_customers", 1)));
    assert!(extra.contains(&("marketwire_hub_connections", 1)));

    a.disconnect(&app);
    let extra = app.metrics_extra();
    assert!(extra.contains(&("marketwire_presence_customers", 0)));
    assert!(extra.contains(&("marketwire_hub_connections", 0)));
}
