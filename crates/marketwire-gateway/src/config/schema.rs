use serde::Deserialize;
use marketwire_core::error::{RelayError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub limits: LimitsSection,

    #[serde(default)]
    pub presence: PresenceSection,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            limits: LimitsSection::default(),
            presence: PresenceSection::default(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RelayError::BadRequest(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        self.gateway.validate()?;
        self.limits.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Per-connection outbound queue depth.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            outbound_queue: default_outbound_queue(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(RelayError::BadRequest(
                "gateway.listen must be a valid socket address".into(),
            ));
        }
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(RelayError::BadRequest(
                "gateway.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(RelayError::BadRequest(
                "gateway.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(RelayError::BadRequest(
                "gateway.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        if !(1..=65536).contains(&self.outbound_queue) {
            return Err(RelayError::BadRequest(
                "gateway.outbound_queue must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_outbound_queue() -> usize {
    256
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsSection {
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl LimitsSection {
    pub fn validate(&self) -> Result<()> {
        if !(256..=16 * 1024 * 1024).contains(&self.max_frame_bytes) {
            return Err(RelayError::BadRequest(
                "limits.max_frame_bytes must be between 256 and 16777216".into(),
            ));
        }
        Ok(())
    }
}

fn default_max_frame_bytes() -> usize {
    64 * 1024
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresenceSection {
    /// Report the admin offline on every disconnect, not only the admin's own.
    #[serde(default = "default_true")]
    pub broadcast_admin_offline_on_any_disconnect: bool,
}

impl Default for PresenceSection {
    fn default() -> Self {
        Self {
            broadcast_admin_offline_on_any_disconnect: true,
        }
    }
}

fn default_true() -> bool {
    true
}
