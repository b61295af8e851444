//! Reqwest-based client for the SpringXD admin REST API.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::error::{root_cause, InterpreterError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Stream,
    Job,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Stream => "stream",
            ResourceKind::Job => "job",
        }
    }

    fn definitions_path(self) -> &'static str {
        match self {
            ResourceKind::Stream => "streams/definitions",
            ResourceKind::Job => "jobs/definitions",
        }
    }
}

/// What the interpreter needs from a SpringXD cluster, per resource kind.
#[async_trait]
pub trait ResourceOperations: Send + Sync {
    /// Creates and deploys `name`.
    async fn create(&self, kind: ResourceKind, name: &str, definition: &str) -> Result<()>;

    async fn destroy(&self, kind: ResourceKind, name: &str) -> Result<()>;

    /// Whole-line suggestions for `prefix`. `None` when the server answered without a list.
    async fn completions(
        &self,
        kind: ResourceKind,
        prefix: &str,
        detail_level: u32,
    ) -> Result<Option<Vec<String>>>;
}

/// Builds the operations object for a cluster URL. Swapped out in tests.
pub trait OperationsFactory: Send + Sync {
    fn connect(&self, base_url: &str, timeout: Duration) -> Result<Arc<dyn ResourceOperations>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SpringXdConnector;

impl OperationsFactory for SpringXdConnector {
    fn connect(&self, base_url: &str, timeout: Duration) -> Result<Arc<dyn ResourceOperations>> {
        Ok(Arc::new(SpringXdClient::new(base_url, timeout)?))
    }
}

#[derive(Debug)]
pub struct SpringXdClient {
    http: Client,
    base_url: Url,
}

impl SpringXdClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| InterpreterError::Connect(format!("{e}: {base_url}")))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.host_str().is_none() {
            return Err(InterpreterError::Connect(format!("not an HTTP URL: {base_url}")));
        }

        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ResourceOperations for SpringXdClient {
    async fn create(&self, kind: ResourceKind, name: &str, definition: &str) -> Result<()> {
        let url = self.endpoint(kind.definitions_path());
        let failed = |message: String| InterpreterError::ResourceCreate { name: name.to_string(), message };

        let resp = self
            .http
            .post(&url)
            .form(&[("name", name), ("definition", definition), ("deploy", "true")])
            .send()
            .await
            .map_err(|e| failed(root_cause(&e)))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let text = resp.text().await.unwrap_or_default();
        Err(failed(decode_error_body(status, &text)))
    }

    async fn destroy(&self, kind: ResourceKind, name: &str) -> Result<()> {
        let url = self.endpoint(&format!("{}/{}", kind.definitions_path(), name));
        let failed = |message: String| InterpreterError::ResourceDestroy { name: name.to_string(), message };

        let resp = self.http.delete(&url).send().await.map_err(|e| failed(root_cause(&e)))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let text = resp.text().await.unwrap_or_default();
        Err(failed(decode_error_body(status, &text)))
    }

    async fn completions(
        &self,
        kind: ResourceKind,
        prefix: &str,
        detail_level: u32,
    ) -> Result<Option<Vec<String>>> {
        let url = self.endpoint(&format!("completions/{}", kind.as_str()));
        let resp = self
            .http
            .get(&url)
            .query(&[("start", prefix.to_string()), ("detailLevel", detail_level.to_string())])
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK => Ok(resp.json::<Option<Vec<String>>>().await?),
            status => {
                let text = resp.text().await.unwrap_or_default();
                Err(InterpreterError::Completion(decode_error_body(status, &text)))
            }
        }
    }
}

/// SpringXD error body entry (`application/vnd.error+json`).
#[derive(Debug, Deserialize)]
struct VndError {
    message: String,
}

/// The server's own message when the body carries one, else the HTTP status.
fn decode_error_body(status: StatusCode, text: &str) -> String {
    if let Ok(errors) = serde_json::from_str::<Vec<VndError>>(text) {
        if let Some(first) = errors.into_iter().next() {
            return first.message;
        }
    }
    if let Ok(error) = serde_json::from_str::<VndError>(text) {
        return error.message;
    }
    if text.trim().is_empty() {
        status.to_string()
    } else {
        format!("{} - {}", status, text.trim())
    }
}
