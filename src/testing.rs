//! In-process HTTP stub used by adapter and dispatcher tests.
//!
//! Each route answers with a canned status and body; anything else gets a
//! 404. Every request is recorded before the response is returned.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct StubRoute {
    pub method: Method,
    pub path: String,
    pub status: u16,
    pub body: String,
}

impl StubRoute {
    pub fn post(path: &str, status: u16, body: &str) -> Self {
        Self {
            method: Method::POST,
            path: path.to_string(),
            status,
            body: body.to_string(),
        }
    }

    pub fn get(path: &str, status: u16, body: &str) -> Self {
        Self {
            method: Method::GET,
            ..Self::post(path, status, body)
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

struct StubState {
    routes: Vec<StubRoute>,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct StubServer {
    addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubServer {
    pub async fn start(routes: Vec<StubRoute>) -> Self {
        let state = Arc::new(StubState {
            routes,
            requests: Mutex::new(Vec::new()),
        });

        let router = Router::new()
            .fallback(stub_handler)
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self { addr, state }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }
}

/// URL on a local port nobody is listening on.
pub async fn closed_url(path: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}{}", addr, path)
}

async fn stub_handler(
    State(state): State<Arc<StubState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let path = uri.path().to_string();

    let (status, reply) = state
        .routes
        .iter()
        .find(|r| r.method == method && r.path == path)
        .map(|r| (r.status, r.body.clone()))
        .unwrap_or((404, r#"{"message": "Not Found"}"#.to_string()));

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path,
        query: uri.query().map(str::to_string),
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    });

    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        [(header::CONTENT_TYPE, "application/json")],
        reply,
    )
}
