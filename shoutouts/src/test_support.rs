//! Helpers shared by the HTTP tests

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::error::{DatabaseError, Result};
use crate::model::{RecipientCount, Shoutout, ShoutoutId};
use crate::query::ShoutoutFilter;
use crate::store::ShoutoutStore;

/// A store whose every operation fails as if the server were unreachable
pub struct FailingStore;

fn offline<T>() -> Result<T> {
    Err(DatabaseError::connection_failed("server selection timeout").into())
}

impl ShoutoutStore for FailingStore {
    async fn find(&self, _filter: &ShoutoutFilter) -> Result<Vec<Shoutout>> {
        offline()
    }

    async fn find_by_id(&self, _id: &ShoutoutId) -> Result<Option<Shoutout>> {
        offline()
    }

    async fn top_recipients(&self, _limit: i64) -> Result<Vec<RecipientCount>> {
        offline()
    }

    async fn insert(&self, _shoutout: &Shoutout) -> Result<ShoutoutId> {
        offline()
    }

    async fn delete(&self, _id: &ShoutoutId) -> Result<bool> {
        offline()
    }

    async fn replace(&self, _id: &ShoutoutId, _shoutout: &Shoutout) -> Result<bool> {
        offline()
    }

    async fn ping(&self) -> Result<()> {
        offline()
    }
}

/// A response reduced to what the tests inspect
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    /// Body parsed as JSON
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap()
    }
}

/// Send one request through the router
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    TestResponse {
        status,
        headers,
        bytes,
    }
}
