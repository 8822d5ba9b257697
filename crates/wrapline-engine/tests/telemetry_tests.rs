// Engine log output through the embedding subscriber

mod common;

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use wrapline_engine::telemetry::engine_subscriber;
use wrapline_engine::{Client, InvokeOptions, Payload};

use common::{math_package, uri};

/// Shared in-memory log sink
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_engine_events_reach_embedder_writer() {
    let captured = Captured::default();
    let sink = captured.clone();
    let subscriber = engine_subscriber("debug", true, move || sink.clone()).unwrap();
    let _guard = tracing::subscriber::set_default(subscriber);

    let client = Client::builder()
        .add_plugin(uri("wrap://test/math"), math_package())
        .build_client()
        .unwrap();
    let result = client
        .invoke(InvokeOptions::new(uri("wrap://test/math"), "add").with_args(json!({ "a": 1, "b": 2 })))
        .await
        .unwrap();
    assert_eq!(result, Payload::Value(json!(3)));

    tracing::debug!(target: "unrelated_crate", "below the default level");
    tracing::warn!(target: "unrelated_crate", "at the default level");

    let output = captured.text();
    assert!(output.contains("uri resolved"));
    assert!(output.contains("wrapline_engine::client"));
    assert!(output.contains("at the default level"));
    assert!(!output.contains("below the default level"));
}
