//! Inbound frame vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use canvasxd_core::protocol::envelope::Response;
use canvasxd_core::protocol::frame::{decode_frame, frame_type, EventFrame};

use vector_loader::TestVector;

fn load(name: &str) -> TestVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}

#[test]
fn frame_vectors() {
    let files = [
        "callback_ok.json",
        "callback_invalid_session.json",
        "event_streaming.json",
        "foreign_module.json",
        "not_json.json",
        "truncated_json.json",
    ];

    for f in files {
        let v = load(f);
        let res = decode_frame(&v.frame.raw());

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let data = res.expect("expected decoded frame");
        let ex = v.expect.expect("missing expect block");
        assert_eq!(frame_type(&data), ex["type"].as_str(), "vector={}", v.description);

        match frame_type(&data) {
            Some("callback") => {
                let r: Response = serde_json::from_value(data).unwrap();
                assert_eq!(r.seq.map(u64::from), ex["seq"].as_u64(), "vector={}", v.description);
                assert_eq!(r.status.map(u64::from), ex["status"].as_u64(), "vector={}", v.description);
                assert_eq!(
                    r.is_invalid_session(),
                    ex["invalid_session"].as_bool().unwrap_or(false),
                    "vector={}",
                    v.description
                );
            }
            Some("event") => {
                let e: EventFrame = serde_json::from_value(data).unwrap();
                assert_eq!(e.payload.name, ex["name"].as_str().unwrap(), "vector={}", v.description);
                assert_eq!(e.payload.topic(), ex["topic"].as_str(), "vector={}", v.description);
            }
            other => panic!("unexpected frame type {other:?} in {}", v.description),
        }
    }
}
