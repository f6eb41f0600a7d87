//! canvasxd loopback harness.
//!
//! Runs a `Client` against in-memory host bindings and plays the parent's
//! side of the conversation: answers `ctx`, pushes a streaming notice, and
//! lets autogrow post a couple of resizes. Useful for eyeballing the wire
//! traffic with `RUST_LOG=canvasxd_sdk=debug`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

use canvasxd_core::protocol::envelope::Response;
use canvasxd_core::Result;
use canvasxd_sdk::config::{self, ClientConfig};
use canvasxd_sdk::dispatch::Subscription;
use canvasxd_sdk::host::{DocumentMetrics, MemoryHost};
use canvasxd_sdk::session::MemoryStore;
use canvasxd_sdk::Client;

const CONFIG_PATH: &str = "canvasxd.yaml";
const PARENT_ORIGIN: &str = "https://parent.example.com";

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = if Path::new(CONFIG_PATH).exists() {
        config::load_from_file(CONFIG_PATH)?
    } else {
        ClientConfig::default()
    };

    let host = Arc::new(
        MemoryHost::new()
            .with_hash("#access_token=loopback-token&instance_id=loopback&target_origin=https%253A%252F%252Fparent.example.com")
            .with_window_name("canvas-frame-loopback"),
    );
    let client = Client::new(cfg, host.clone(), Arc::new(MemoryStore::new()))?;
    tracing::info!(version = ?client.version(), "loopback client ready");

    client.ctx(
        |r: Response| tracing::info!(status = ?r.status, payload = %r.payload, "ctx answered"),
        None,
    )?;
    for posted in host.take_posted() {
        let Some(seq) = posted.json().and_then(|m| m.get("seq").and_then(|s| s.as_u64())) else {
            continue;
        };
        let answer = json!({
            "type": "callback",
            "seq": seq,
            "status": 200,
            "statusText": "OK",
            "parentVersion": "41.0",
            "payload": { "user": { "userName": "loopback@example.com" } },
        });
        client.deliver(PARENT_ORIGIN, &answer.to_string());
    }

    client.subscribe(
        None,
        [Subscription::streaming("/topic/Loopback")
            .on_data(|v| tracing::info!(payload = %v, "streaming data"))],
    )?;
    let notice = json!({
        "type": "event",
        "payload": {
            "name": "sfdc.streamingapi",
            "params": { "topic": "/topic/Loopback" },
            "method": "onData",
            "payload": { "sobject": { "Id": "001" } },
        },
    });
    client.deliver(PARENT_ORIGIN, &notice.to_string());

    host.set_metrics(DocumentMetrics {
        scroll_height: 900,
        client_height: 600,
        scroll_width: 800,
        client_width: 800,
        ..DocumentMetrics::default()
    });
    client.autogrow(None, Some(true), Some(Duration::from_millis(50)))?;
    tokio::time::sleep(Duration::from_millis(130)).await;
    client.autogrow(None, Some(false), None)?;

    for posted in host.take_posted() {
        tracing::info!(target_origin = %posted.target_origin, message = %posted.message, "posted");
    }
    client.detach();
    Ok(())
}
