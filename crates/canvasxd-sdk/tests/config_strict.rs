#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use canvasxd_sdk::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
client:
  autogrow_intervall_ms: 100 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.client.client_version, "41.0");
    assert_eq!(cfg.client.autogrow_interval(), Duration::from_millis(300));
    assert!(cfg.client.pin_inbound_origin);
    assert!(cfg.events.reserved_namespaces.iter().any(|ns| ns == "sfdc"));
}

#[test]
fn rejects_unsupported_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn rejects_out_of_range_interval_and_dotted_namespace() {
    let slow = "version: 1\nclient:\n  autogrow_interval_ms: 5\n";
    assert!(config::load_from_str(slow).is_err());

    let dotted = "version: 1\nevents:\n  reserved_namespaces: [\"a.b\"]\n";
    assert!(config::load_from_str(dotted).is_err());
}

#[test]
fn custom_reserved_namespaces_drive_validation() {
    let cfg = config::load_from_str("version: 1\nevents:\n  reserved_namespaces: [\"acme\"]\n").unwrap();
    let policy = cfg.event_names();
    assert!(policy.validate("acme.thing", &[]).is_err());
    assert!(policy.validate("sfdc.thing", &[]).is_ok());
}
