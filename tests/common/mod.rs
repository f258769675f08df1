// Each integration test file is a separate binary; helpers not used in every
// binary would otherwise trigger dead_code warnings from clippy.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    async_trait,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use seo_inspector::{
    fetch::{FetchError, Fetcher},
    handlers,
    state::AppState,
};

/// In-memory fetcher: serves canned markup per URL and records every URL it
/// was asked for. Unknown URLs fail like an unreachable host.
#[derive(Clone, Default)]
pub struct StubFetcher {
    pages: Arc<HashMap<String, Result<String, u16>>>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, markup: &str) -> Self {
        self.with_entry(url, Ok(markup.to_string()))
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.with_entry(url, Err(status))
    }

    fn with_entry(self, url: &str, entry: Result<String, u16>) -> Self {
        let mut pages = (*self.pages).clone();
        pages.insert(url.to_string(), entry);
        Self {
            pages: Arc::new(pages),
            requested: self.requested,
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch_markup(&self, url: &Url) -> Result<String, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        match self.pages.get(url.as_str()) {
            Some(Ok(markup)) if markup.trim().is_empty() => Err(FetchError::Empty),
            Some(Ok(markup)) => Ok(markup.clone()),
            Some(Err(status)) => Err(FetchError::Status(*status)),
            None => Err(FetchError::Transport("connection refused".into())),
        }
    }
}

/// Build the application router wired to the given fetcher.
pub fn create_test_app(fetcher: StubFetcher) -> Router {
    handlers::router(AppState::new(fetcher))
}

// ── Request helpers ──────────────────────────────────────────────────────────

pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, bytes) = get_raw(app, uri).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn get_raw(app: Router, uri: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
    let req = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, bytes.to_vec())
}

/// `/analyze?url=...` with the target percent-encoded.
pub fn analyze_uri(target: &str) -> String {
    format!("/analyze?url={}", urlencoding::encode(target))
}

pub fn export_uri(target: &str) -> String {
    format!("/analyze/export?url={}", urlencoding::encode(target))
}
