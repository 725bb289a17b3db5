//! Error-message and config integration tests over the public surface.
//!
//! Diagnostics are part of the contract: an aborted session must name the
//! endpoint, path, or input that caused it.

use assert_fs::prelude::*;
use tether_core::{paths, CoreError, Endpoint, EndpointId, RemoteAddress, SyncConfig};

// ---------------------------------------------------------------------------
// Address parsing
// ---------------------------------------------------------------------------

#[test]
fn invalid_address_names_the_offending_input() {
    let err = "just-a-hostname".parse::<RemoteAddress>().unwrap_err();
    assert!(matches!(err, CoreError::InvalidAddress { .. }), "got: {err}");
    let msg = err.to_string();
    assert!(msg.contains("just-a-hostname"), "must quote the input, got: {msg}");
    assert!(msg.contains("colon"), "must explain the expected shape, got: {msg}");
}

#[test]
fn empty_path_is_called_out_explicitly() {
    let err = "host:".parse::<RemoteAddress>().unwrap_err();
    assert!(err.to_string().contains("path"), "got: {err}");
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

#[test]
fn corrupt_config_error_carries_its_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".tether/config.yaml")
        .write_str(": : corrupt : yaml : [unclosed")
        .expect("write");

    let err = SyncConfig::load_at(home.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigParse { .. }), "got: {err}");
    assert!(
        err.to_string().contains("config.yaml"),
        "must contain the file path, got: {err}"
    );
}

#[test]
fn config_round_trips_through_yaml() {
    let config = SyncConfig {
        daemon_bind_port: 5000,
        daemon_connect_port: 5001,
        debounce_ms: 42,
        idle_wait_secs: 7,
    };
    let yaml = serde_yaml::to_string(&config).expect("serialize");
    let parsed: SyncConfig = serde_yaml::from_str(&yaml).expect("parse");
    assert_eq!(parsed, config);
}

#[test]
fn defaults_match_the_shared_constants() {
    let config = SyncConfig::default();
    assert_eq!(config.daemon_bind_port, paths::DAEMON_BIND_PORT);
    assert_eq!(config.daemon_connect_port, paths::DAEMON_CONNECT_PORT);
    assert_eq!(config.debounce(), paths::DEBOUNCE_WINDOW);
    assert_eq!(config.idle_wait(), paths::IDLE_WAIT);
}

// ---------------------------------------------------------------------------
// Command failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn command_failure_names_command_and_endpoint() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let ep = Endpoint::local_at(EndpointId::Local, home.path(), home.path().to_path_buf())
        .expect("endpoint");

    let err = ep
        .run(None, &["ls", "/definitely/not/a/path"])
        .await
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("ls /definitely/not/a/path"), "got: {msg}");
    assert!(msg.contains("localhost"), "got: {msg}");
}
