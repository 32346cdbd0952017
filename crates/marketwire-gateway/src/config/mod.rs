//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use marketwire_core::error::{RelayError, Result};

pub use schema::{GatewayConfig, GatewaySection, LimitsSection, PresenceSection};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "MARKETWIRE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "marketwire.yaml";

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| RelayError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Read and parse `path`; a missing file yields the defaults.
pub fn load_or_default(path: &str) -> Result<GatewayConfig> {
    match fs::read_to_string(path) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path, "config file not found, using defaults");
            Ok(GatewayConfig::default())
        }
        Err(e) => Err(RelayError::Internal(format!("read config failed ({path}): {e}"))),
    }
}

/// Path from `MARKETWIRE_CONFIG`, else `marketwire.yaml`.
pub fn config_path() -> String {
    std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
