//! WebSocket handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS (refused with 503 while draining)
//! - Give the connection a hub handle, an outbound queue, and a tracing span
//! - Decode-once, then hand events to the dispatcher
//! - Lifecycle: ping + idle timeout; disconnect runs exactly once on any exit

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::Instrument;

use marketwire_core::error::RelayError;
use marketwire_core::protocol::{ErrorBody, ServerEvent};
use marketwire_core::ConnId;

use crate::app_state::AppState;
use crate::dispatch::Lifecycle;
use crate::realtime::Connection;
use crate::transport::codec::{decode, Inbound};
use crate::transport::idle::IdleTimer;

// --------------------
// Entry
// --------------------
pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    if app.is_draining() {
        return (StatusCode::SERVICE_UNAVAILABLE, "draining").into_response();
    }
    app.metrics().ws_upgrades.inc(&[]);
    ws.on_upgrade(move |socket| run_session(app, socket))
}

async fn run_session(app: AppState, socket: WebSocket) {
    let (out_tx, out_rx) = mpsc::channel::<Message>(app.cfg().gateway.outbound_queue);
    let conn = app.hub().connect(Connection { tx: out_tx.clone() });
    let span = tracing::info_span!("conn", conn_id = %conn);
    session_loop(app, conn, socket, out_tx, out_rx)
        .instrument(span)
        .await;
}

/// Best-effort `error` event to the offending peer only.
fn send_error(out_tx: &mpsc::Sender<Message>, e: &RelayError) {
    match ServerEvent::Error(ErrorBody::from(e)).encode() {
        Ok(s) => {
            let _ = out_tx.try_send(Message::Text(s));
        }
        Err(err) => tracing::warn!(error = %err, "error event encode failed"),
    }
}

// --------------------
// Core session loop
// --------------------
async fn session_loop(
    app: AppState,
    conn: ConnId,
    socket: WebSocket,
    out_tx: mpsc::Sender<Message>,
    mut out_rx: mpsc::Receiver<Message>,
) {
    let dispatcher = app.dispatcher();
    let metrics = app.metrics();
    let max_frame_bytes = app.cfg().limits.max_frame_bytes;

    let mut link = Lifecycle::new(conn);
    metrics.ws_active_connections.inc(&[]);
    tracing::info!("socket connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    let gw = &app.cfg().gateway;
    let ping_every = Duration::from_millis(gw.ping_interval_ms);
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);

    let mut ping_tick = tokio::time::interval_at(Instant::now() + ping_every, ping_every);
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut idle = IdleTimer::new(idle_timeout);

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                match maybe_out {
                    Some(m) => {
                        if ws_tx.send(m).await.is_err() {
                            tracing::debug!("write failed");
                            break;
                        }
                    }
                    None => break,
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(Ok(msg)) = incoming else { break; };
                idle.touch();

                match decode(msg, max_frame_bytes) {
                    Ok(Inbound::Event(ev)) => {
                        dispatcher.dispatch(&mut link, ev);
                    }
                    Ok(Inbound::Ping(payload)) => {
                        let _ = out_tx.try_send(Message::Pong(payload));
                    }
                    Ok(Inbound::Pong(_)) => {}
                    Ok(Inbound::Close) => break,
                    Err(e) => {
                        metrics.decode_errors.inc(&[("code", e.client_code().as_str())]);
                        tracing::warn!(error = %e, "rejected inbound frame");
                        send_error(&out_tx, &e);
                    }
                }
            }

            // ping
            _ = ping_tick.tick() => {
                let _ = out_tx.try_send(Message::Ping(Vec::new()));
            }

            // idle timeout
            () = idle.expired() => {
                tracing::info!("idle timeout");
                break;
            }
        }
    }

    dispatcher.disconnect(&mut link);
    metrics.ws_active_connections.dec(&[]);
    let _ = ws_tx.close().await;
}
