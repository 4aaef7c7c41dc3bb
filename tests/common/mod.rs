#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use navdesk_api::app::{router, AppState};
use navdesk_api::navigation::{EditorPolicy, MemoryNavigationStore, Page};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// In-process server over a shared in-memory store
pub struct TestApp {
    pub router: Router,
    pub store: MemoryNavigationStore,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_policy(EditorPolicy::default())
    }

    pub fn with_policy(policy: EditorPolicy) -> Self {
        let store = MemoryNavigationStore::new();
        let router = router(AppState::in_memory(store.clone(), policy));
        Self { router, store }
    }

    /// Register pages in the catalog, returning them in the given order
    pub async fn seed_pages(&self, names: &[&str]) -> Vec<Page> {
        let mut pages = Vec::new();
        for name in names {
            let page = Page::new(Uuid::new_v4(), *name, format!("/{}", name.to_lowercase()));
            self.store.upsert_page(page.clone()).await;
            pages.push(page);
        }
        pages
    }

    pub async fn get(&self, uri: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, uri, None, None).await
    }

    pub async fn get_with_token(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, uri, None, Some(token)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::PUT, uri, Some(body), None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, uri, Some(body), None).await
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Result<(StatusCode, Value)> {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => request.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .context("failed to read body")?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("body was not JSON")?
        };
        Ok((status, value))
    }
}

/// Page ids of one tree level, in rendered order
pub fn tree_ids(level: &Value) -> Vec<String> {
    level
        .as_array()
        .map(|nodes| {
            nodes
                .iter()
                .filter_map(|n| n["page"]["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

static MISSING: Value = Value::Null;

/// The wire triple for `page` in a page-order response
pub fn entry<'a>(entries: &'a Value, page: &Page) -> &'a Value {
    entries
        .as_array()
        .and_then(|rows| rows.iter().find(|r| r["page_id"] == page.id.to_string()))
        .unwrap_or(&MISSING)
}
