//! Integration tests for RoyShop.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p royshop-integration-tests
//! ```
//!
//! No external services are needed: storage lives in a temporary directory
//! and the backend is either the in-memory gateway or [`StubServer`], a
//! canned-response axum app the real client talks to.
//!
//! # Test Categories
//!
//! - `cart_persistence` - Cart durability across sessions and legacy data
//! - `checkout_flow` - Browsing, ordering, reviewing and the dashboard end to end
//! - `supabase_client` - The HTTP client against a stub backend

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use axum::extract::State;
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use royshop_storefront::config::{ConfigError, StorefrontConfig, SupabaseConfig};
use royshop_storefront::gateway::MemoryGateway;
use royshop_storefront::state::AppState;
use royshop_storefront::storage::FileStore;
use secrecy::SecretString;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// Admin password used by [`config`].
pub const ADMIN_PASSWORD: &str = "integration-pw";

/// Storefront configuration rooted at `data_dir`.
///
/// # Panics
///
/// Never in practice; the lookup only sets valid values.
#[must_use]
pub fn config(data_dir: &Path) -> StorefrontConfig {
    let data_dir = data_dir.to_string_lossy().into_owned();
    StorefrontConfig::from_lookup(&|key| match key {
        "ROYSHOP_DATA_DIR" => Some(data_dir.clone()),
        "ROYSHOP_ADMIN_PASSWORD" => Some(ADMIN_PASSWORD.to_string()),
        _ => None,
    })
    .unwrap_or_else(|e| panic!("invalid test configuration: {e}"))
}

/// A session backed by files in `data_dir`, like the CLI uses.
///
/// # Panics
///
/// Panics if the data directory cannot be opened.
#[must_use]
pub fn file_session(
    data_dir: &Path,
    gateway: Result<MemoryGateway, ConfigError>,
) -> AppState<MemoryGateway, Arc<FileStore>> {
    let store = FileStore::open(data_dir)
        .unwrap_or_else(|e| panic!("cannot open {}: {e}", data_dir.display()));
    AppState::new(config(data_dir), gateway, Arc::new(store))
}

// =============================================================================
// Stub Backend
// =============================================================================

/// A canned HTTP response.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
    pub headers: Vec<(String, String)>,
}

impl StubResponse {
    #[must_use]
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// A request as received by the stub.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query, percent-encoded as sent.
    pub target: String,
    /// Header names lowercased.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == &name.to_ascii_lowercase())
            .map(|(_, v)| v.as_str())
    }
}

struct StubState {
    responses: Vec<StubResponse>,
    requests: Vec<RecordedRequest>,
}

impl StubState {
    /// Record `request` and pick its response; the last one repeats.
    fn answer(&mut self, request: RecordedRequest) -> StubResponse {
        self.requests.push(request);
        if self.responses.len() > 1 {
            self.responses.remove(0)
        } else {
            self.responses
                .first()
                .cloned()
                .unwrap_or_else(|| StubResponse::json(500, serde_json::Value::Null))
        }
    }
}

type SharedStub = Arc<Mutex<StubState>>;

/// An axum app on an ephemeral local port answering every request with the
/// next canned response. The last response repeats once the queue runs out.
pub struct StubServer {
    url: Url,
    state: SharedStub,
    handle: JoinHandle<()>,
}

impl StubServer {
    /// Bind to an ephemeral local port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound or `responses` is empty.
    pub async fn start(responses: Vec<StubResponse>) -> Self {
        assert!(!responses.is_empty(), "stub needs at least one response");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("bind stub server: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("stub address: {e}"));
        let url = Url::parse(&format!("http://{addr}"))
            .unwrap_or_else(|e| panic!("stub url: {e}"));

        let state = Arc::new(Mutex::new(StubState {
            responses,
            requests: Vec::new(),
        }));

        let app = Router::new()
            .fallback(respond)
            .with_state(Arc::clone(&state));
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                panic!("stub server stopped: {e}");
            }
        });

        Self { url, state, handle }
    }

    /// Backend configuration pointing at this server.
    #[must_use]
    pub fn supabase_config(&self) -> SupabaseConfig {
        SupabaseConfig {
            url: self.url.clone(),
            anon_key: SecretString::from("stub-anon-key"),
        }
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .requests
            .clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn respond(
    State(state): State<SharedStub>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let request = RecordedRequest {
        method: method.to_string(),
        target: uri
            .path_and_query()
            .map_or_else(|| uri.path().to_string(), ToString::to_string),
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body,
    };

    let canned = state
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .answer(request);

    let status = StatusCode::from_u16(canned.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        canned.body,
    )
        .into_response();
    for (name, value) in &canned.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            response.headers_mut().insert(name, value);
        }
    }
    response
}
