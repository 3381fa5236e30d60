//! MockProvider - in-process stand-in for the generative provider
//!
//! Serves the OpenAI-compatible endpoints the client calls, plus the image
//! files their URLs point at. Behaviour is scripted per test and every
//! request is recorded for assertions.

use std::collections::HashSet;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use parking_lot::Mutex;
use serde_json::{json, Value};
use steelblock::config::ProviderConfig;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// API key the mock accepts
pub const TEST_API_KEY: &str = "test-key";

/// Scripted provider behaviour
#[derive(Debug, Clone)]
pub struct ProviderScript {
    /// Fail chat completions with (status, message)
    pub chat_failure: Option<(u16, String)>,
    /// Fail image generations with (status, message)
    pub image_failure: Option<(u16, String)>,
    /// Return empty `choices` / `data` arrays
    pub empty_responses: bool,
    /// Answer 200 with bodies the client cannot use: plain text for chat,
    /// inline `b64_json` instead of a URL for images
    pub malformed_responses: bool,
    /// Image files that answer 404
    pub missing_files: HashSet<String>,
    /// Image files that answer with non-image bytes
    pub corrupt_files: HashSet<String>,
    /// Size of served images
    pub image_dims: (u32, u32),
    /// Hold chat completions until notified
    pub gate: Option<Arc<Notify>>,
}

impl Default for ProviderScript {
    fn default() -> Self {
        Self {
            chat_failure: None,
            image_failure: None,
            empty_responses: false,
            malformed_responses: false,
            missing_files: HashSet::new(),
            corrupt_files: HashSet::new(),
            image_dims: (16, 16),
            gate: None,
        }
    }
}

/// One request seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub body: Value,
}

struct MockState {
    addr: SocketAddr,
    script: Mutex<ProviderScript>,
    calls: Mutex<Vec<RecordedCall>>,
}

/// Mock provider bound to a random local port
pub struct MockProvider {
    pub addr: SocketAddr,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockProvider {
    /// Start a mock provider with default behaviour
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(MockState {
            addr,
            script: Mutex::new(ProviderScript::default()),
            calls: Mutex::new(Vec::new()),
        });

        let router = Router::new()
            .route("/v1/chat/completions", post(chat_completions))
            .route("/v1/images/generations", post(image_generations))
            .route("/files/{name}", get(image_file))
            .with_state(state.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    /// Provider settings pointing at this mock
    pub fn config(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: Some(TEST_API_KEY.to_string()),
            base_url: format!("http://{}/v1", self.addr),
            timeout_secs: 5,
            ..ProviderConfig::default()
        }
    }

    /// Change the scripted behaviour
    pub fn script(&self, f: impl FnOnce(&mut ProviderScript)) {
        f(&mut self.state.script.lock());
    }

    /// All requests received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().clone()
    }

    /// Request paths received so far, in order
    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }

    pub fn clear_calls(&self) {
        self.state.calls.lock().clear();
    }

    /// Wait until a request for `path` has been received
    pub async fn wait_for_call(&self, path: &str, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.paths().iter().any(|p| p == path) {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        anyhow::bail!("Timeout waiting for provider call to {}", path)
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Encode a solid PNG of the given size
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([90, 90, 90]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .expect("PNG encoding failed");
    buf.into_inner()
}

fn record(state: &MockState, path: &str, body: Value) {
    state.calls.lock().push(RecordedCall {
        path: path.to_string(),
        body,
    });
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == format!("Bearer {}", TEST_API_KEY))
}

fn api_error(status: u16, message: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({ "error": { "message": message, "type": "mock_error" } })),
    )
        .into_response()
}

async fn chat_completions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, "/v1/chat/completions", body.clone());

    if !authorized(&headers) {
        return api_error(401, "Incorrect API key provided");
    }

    let script = state.script.lock().clone();
    if let Some(gate) = script.gate {
        gate.notified().await;
    }
    if let Some((status, message)) = script.chat_failure {
        return api_error(status, &message);
    }
    if script.empty_responses {
        return Json(json!({ "choices": [] })).into_response();
    }
    if script.malformed_responses {
        return (
            [(header::CONTENT_TYPE, "text/plain")],
            "upstream said something that is not JSON",
        )
            .into_response();
    }

    let prompt = body["messages"][1]["content"].as_str().unwrap_or_default();
    Json(json!({
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": format!("  Home for: {}\n\n", prompt) }
        }]
    }))
    .into_response()
}

async fn image_generations(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, "/v1/images/generations", body.clone());

    if !authorized(&headers) {
        return api_error(401, "Incorrect API key provided");
    }

    let script = state.script.lock().clone();
    if let Some((status, message)) = script.image_failure {
        return api_error(status, &message);
    }
    if script.empty_responses {
        return Json(json!({ "data": [] })).into_response();
    }
    if script.malformed_responses {
        return Json(json!({ "created": 0, "data": [{ "b64_json": "iVBORw0KGgo=" }] }))
            .into_response();
    }

    let prompt = body["prompt"].as_str().unwrap_or_default();
    let name = if prompt.starts_with("Architectural floor plan") {
        "floor_plan"
    } else {
        "render"
    };

    Json(json!({
        "created": 0,
        "data": [{ "url": format!("http://{}/files/{}.png", state.addr, name) }]
    }))
    .into_response()
}

async fn image_file(State(state): State<Arc<MockState>>, Path(name): Path<String>) -> Response {
    record(&state, &format!("/files/{}", name), Value::Null);

    let stem = name.trim_end_matches(".png").to_string();
    let script = state.script.lock().clone();

    if script.missing_files.contains(&stem) {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    }
    if script.corrupt_files.contains(&stem) {
        return (
            [(header::CONTENT_TYPE, "image/png")],
            Bytes::from_static(b"<html>expired link</html>"),
        )
            .into_response();
    }

    let (width, height) = script.image_dims;
    ([(header::CONTENT_TYPE, "image/png")], png_bytes(width, height)).into_response()
}
