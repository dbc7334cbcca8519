//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use elections_logs::config::AppConfig;
use elections_logs::http::HttpServer;
use elections_logs::lifecycle::Shutdown;
use elections_logs::logging::{Emitter, EmitterConfig, MemorySink};
use serde_json::Value;
use tokio::net::TcpListener;

/// A running API server writing its records to memory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub sink: Arc<MemorySink>,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Records whose message starts with `prefix`.
    pub fn records_starting_with(&self, prefix: &str) -> Vec<Value> {
        self.sink
            .values()
            .into_iter()
            .filter(|v| v["message"].as_str().is_some_and(|m| m.starts_with(prefix)))
            .collect()
    }

    /// Wait until at least `count` records exist, failing after two seconds.
    pub async fn wait_for_records(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.sink.len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("records were not written in time");
    }
}

/// Start the API on an ephemeral port.
pub async fn start_server() -> TestServer {
    let (emitter, sink) = Emitter::in_memory(EmitterConfig::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = AppConfig::default();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, emitter);
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        sink,
        shutdown,
        handle,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
