//! Shared utilities for integration testing: mock backends and a running gateway.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use api_gateway::audit::AuditRecord;
use api_gateway::config::{BackendConfig, GatewayConfig};
use api_gateway::http::GatewayServer;
use api_gateway::lifecycle::Shutdown;
use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A request as seen by the mock records backend.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Mock records backend with request capture.
#[derive(Clone, Default)]
pub struct RecordsBackend {
    pub hits: Arc<AtomicUsize>,
    pub captured: Arc<Mutex<Vec<Captured>>>,
}

impl RecordsBackend {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last(&self) -> Captured {
        self.captured
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("records backend saw no request")
    }
}

async fn records_handler(State(backend): State<RecordsBackend>, request: Request) -> Response {
    backend.hits.fetch_add(1, Ordering::SeqCst);

    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    backend.captured.lock().unwrap().push(Captured {
        method: parts.method.clone(),
        uri: parts.uri.to_string(),
        headers: parts.headers.clone(),
        body: body.clone(),
    });

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| header::HeaderValue::from_static("application/octet-stream"));
    let segments: Vec<&str> = parts.uri.path().trim_start_matches('/').split('/').collect();

    match (parts.method.as_str(), segments.as_slice()) {
        ("GET", ["records"]) => json(StatusCode::OK, r#"[{"id":1,"name":"A"}]"#),
        ("GET", ["records", "slow"]) => {
            tokio::time::sleep(Duration::from_secs(10)).await;
            json(StatusCode::OK, "{}")
        }
        ("GET", ["records", "large"]) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain")],
            "x".repeat(LARGE_BODY_BYTES),
        )
            .into_response(),
        ("GET", ["records", "1"]) => json(StatusCode::OK, r#"{"id":1,"name":"A"}"#),
        ("GET", ["records", _]) => json(StatusCode::NOT_FOUND, r#"{"error":"not found"}"#),
        ("POST", ["records"]) => {
            (StatusCode::CREATED, [(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        ("PUT", ["records", _]) => {
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        ("DELETE", ["records", _]) => StatusCode::NO_CONTENT.into_response(),
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

/// Size of the body served at `/records/large`.
pub const LARGE_BODY_BYTES: usize = 2000;

fn json(status: StatusCode, body: &'static str) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Start the mock records backend on an ephemeral port.
pub async fn start_records_backend() -> (SocketAddr, RecordsBackend) {
    let backend = RecordsBackend::default();
    let app = Router::new()
        .fallback(records_handler)
        .with_state(backend.clone());
    (serve(app).await, backend)
}

#[derive(Clone)]
struct LogState {
    tx: mpsc::UnboundedSender<AuditRecord>,
    stored: Arc<Mutex<Vec<AuditRecord>>>,
}

async fn ingest_log(State(state): State<LogState>, Json(record): Json<AuditRecord>) -> StatusCode {
    state.stored.lock().unwrap().push(record.clone());
    let _ = state.tx.send(record);
    StatusCode::CREATED
}

async fn list_logs(State(state): State<LogState>) -> Json<Vec<AuditRecord>> {
    Json(state.stored.lock().unwrap().clone())
}

/// Start the mock log backend. Every ingested audit record is sent on the receiver.
pub async fn start_log_backend() -> (SocketAddr, mpsc::UnboundedReceiver<AuditRecord>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let state = LogState {
        tx,
        stored: Arc::default(),
    };
    let app = Router::new()
        .route("/logs", post(ingest_log).get(list_logs))
        .with_state(state);
    (serve(app).await, rx)
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A log backend that accepts connections and never answers.
pub async fn start_hanging_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// A port with nothing listening on it.
pub fn dead_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Gateway config pointing at the given backend ports.
pub fn gateway_config(records_port: u16, logs_port: u16) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.backends.records = BackendConfig::new("127.0.0.1", records_port);
    config.backends.logs = BackendConfig::new("127.0.0.1", logs_port);
    config.audit.timeout_ms = 500;
    config
}

/// Start the gateway. Returns its base URL and the shutdown handle.
pub async fn start_gateway(config: GatewayConfig) -> (String, Shutdown) {
    let shutdown = Shutdown::new();
    let server = GatewayServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (format!("http://{}", addr), shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Wait for the next audit record, failing the test after a deadline.
pub async fn next_audit(rx: &mut mpsc::UnboundedReceiver<AuditRecord>) -> AuditRecord {
    tokio::time::timeout(Duration::from_secs(3), rx.recv())
        .await
        .expect("no audit record within deadline")
        .expect("log backend stopped")
}

/// Assert that no audit record arrives within a short window.
pub async fn assert_no_audit(rx: &mut mpsc::UnboundedReceiver<AuditRecord>) {
    let result = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(result.is_err(), "unexpected audit record: {:?}", result);
}
