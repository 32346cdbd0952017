#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use marketwire_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
gateway:
  listen: "0.0.0.0:8080"
presence:
  broadcast_admin_offline_on_any_disconect: false # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.gateway.listen, "0.0.0.0:8080");
    assert_eq!(cfg.gateway.outbound_queue, 256);
    assert_eq!(cfg.limits.max_frame_bytes, 65536);
    assert!(cfg.presence.broadcast_admin_offline_on_any_disconnect);
}

#[test]
fn full_config_overrides_defaults() {
    let ok = r#"
version: 1
gateway:
  listen: "127.0.0.1:9000"
  ping_interval_ms: 10000
  idle_timeout_ms: 30000
  outbound_queue: 32
limits:
  max_frame_bytes: 1024
presence:
  broadcast_admin_offline_on_any_disconnect: false
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.gateway.listen, "127.0.0.1:9000");
    assert_eq!(cfg.gateway.outbound_queue, 32);
    assert_eq!(cfg.limits.max_frame_bytes, 1024);
    assert!(!cfg.presence.broadcast_admin_offline_on_any_disconnect);
}

#[test]
fn rejects_out_of_range_values() {
    for bad in [
        "version: 2\n",
        "version: 1\ngateway:\n  listen: \"not-an-addr\"\n",
        "version: 1\ngateway:\n  ping_interval_ms: 60000\n  idle_timeout_ms: 30000\n",
        "version: 1\ngateway:\n  outbound_queue: 0\n",
        "version: 1\nlimits:\n  max_frame_bytes: 10\n",
    ] {
        let err = config::load_from_str(bad).expect_err(bad);
        assert_eq!(err.client_code().as_str(), "BAD_REQUEST", "{bad}");
    }
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let cfg = config::load_or_default("definitely/not/here/marketwire.yaml").expect("defaults");
    assert_eq!(cfg.version, 1);
}
