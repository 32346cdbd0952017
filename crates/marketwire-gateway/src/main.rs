//! marketwire gateway binary.
//!
//! - WebSocket endpoint: /v1/ws
//! - Ops endpoints: /healthz, /readyz, /metrics
//! - Config from `MARKETWIRE_CONFIG` (default `marketwire.yaml`, optional)
//! - Graceful shutdown on Ctrl+C / SIGTERM: readiness flips to draining first

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use marketwire_core::error::{RelayError, Result};
use marketwire_gateway::{app_state::AppState, config, router};

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = config::config_path();
    let cfg = config::load_or_default(&path)?;
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .map_err(|e| RelayError::BadRequest(format!("gateway.listen: {e}")))?;

    let state = AppState::new(cfg)?;
    let app = router::build_router(state.clone());

    tracing::info!(%listen, config = %path, "marketwire-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| RelayError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .map_err(|e| RelayError::Internal(format!("server failed: {e}")))?;

    tracing::info!("marketwire-gateway stopped");
    Ok(())
}

async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "ctrl+c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    state.set_draining();
    tracing::info!("shutdown signal received, draining");
}
