//! Integration test harness for the apilama gateway
//!
//! End-to-end tests run real gateways on ephemeral ports and talk to them
//! over HTTP with `reqwest`:
//!
//! - `gateway_e2e_test.rs` - in-process capabilities behind one gateway
//! - `remote_e2e_test.rs` - remote adapters against scripted backends and
//!   against a second gateway
//!
//! ```bash
//! cargo test -p apilama-tests
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use apilama_api::{create_router, AppState};
use apilama_core::{BackendDescriptor, CapabilityKind};
use apilama_gateway::{AvailabilityMonitor, Dispatcher};
use apilama_local::{DirectoryService, FileService, InProcessAdapter, ShellService};
use apilama_proxy::RemoteProxyAdapter;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::path::Path;
use tokio::net::TcpListener;

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    client: Client,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve `router` on an ephemeral port
    pub async fn start(router: axum::Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("build test client");

        Self {
            addr,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Get the base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await
            .expect("GET request");
        read(response).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .json(&body)
            .send()
            .await
            .expect("POST request");
        read(response).await
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .client
            .delete(format!("{}{}", self.base_url(), path))
            .send()
            .await
            .expect("DELETE request");
        read(response).await
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn read(response: reqwest::Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

/// Monitor with a short probe bound so down backends are detected quickly
pub fn test_monitor(ttl: Duration) -> AvailabilityMonitor {
    AvailabilityMonitor::new(ttl, Duration::from_millis(500))
}

/// Router serving files, dirs and shell in-process from `root`
pub fn local_gateway(name: &str, root: &Path) -> axum::Router {
    let mut dispatcher = Dispatcher::new(test_monitor(Duration::from_secs(30)));
    dispatcher.register(
        BackendDescriptor::in_process("files", CapabilityKind::Files),
        Arc::new(InProcessAdapter::new(
            "files",
            Arc::new(FileService::new(root).with_extension(Some("md".to_string()))),
        )),
    );
    dispatcher.register(
        BackendDescriptor::in_process("dirs", CapabilityKind::Dirs),
        Arc::new(InProcessAdapter::new(
            "dirs",
            Arc::new(DirectoryService::new(root)),
        )),
    );
    dispatcher.register(
        BackendDescriptor::in_process("shell", CapabilityKind::Shell),
        Arc::new(InProcessAdapter::new("shell", Arc::new(ShellService::new(root)))),
    );
    create_router(AppState::new(Arc::new(dispatcher), name))
}

/// Dispatcher with every kind forwarded to `endpoint`
pub fn remote_dispatcher(endpoint: &str, monitor: AvailabilityMonitor) -> Dispatcher {
    let probe_timeout = monitor.probe_timeout();
    let mut dispatcher = Dispatcher::new(monitor);
    for kind in CapabilityKind::ALL {
        let descriptor =
            BackendDescriptor::remote(kind.as_str(), kind, endpoint).expect("valid endpoint");
        let adapter = RemoteProxyAdapter::new(&descriptor)
            .expect("remote adapter")
            .with_probe_timeout(probe_timeout);
        dispatcher.register(descriptor, Arc::new(adapter));
    }
    dispatcher
}

/// Router with every kind forwarded to `endpoint`
pub fn remote_gateway(name: &str, endpoint: &str) -> axum::Router {
    let dispatcher = remote_dispatcher(endpoint, test_monitor(Duration::from_secs(30)));
    create_router(AppState::new(Arc::new(dispatcher), name))
}

/// Wait for a condition with timeout
pub async fn wait_for<F, Fut>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;

    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    false
}
