//! `reqwest`-backed indexer client.
//!
//! ## Error Mapping
//!
//! | Failure | `IndexerError` |
//! |---------|----------------|
//! | Connection refused, DNS, request timeout | `Transport` |
//! | Non-2xx status | `Status { code, body }` |
//! | 2xx with a body that is not the expected JSON | `Malformed` |
//!
//! No retries happen here; a failed call is reported once.

use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::{Credentials, IndexerConfig};

use super::{IndexerClient, IndexerError, Method, SearchResponse};

/// HTTP client for an OpenSearch-compatible indexer.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpIndexerClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl HttpIndexerClient {
    pub fn new(config: &IndexerConfig) -> Result<Self, IndexerError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IndexerError::Transport(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            credentials: config.credentials.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, IndexerError> {
        let url = self.endpoint(path);
        let mut req = self.http.request(to_reqwest(method), &url);

        if let Some(creds) = &self.credentials {
            req = req.basic_auth(&creds.username, Some(&creds.password));
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                IndexerError::Transport(format!("request to {url} timed out"))
            } else {
                IndexerError::Transport(e.to_string())
            }
        })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| IndexerError::Transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(IndexerError::Status {
                code: status.as_u16(),
                body: text,
            });
        }

        debug!(status = status.as_u16(), bytes = text.len(), "indexer responded");

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| IndexerError::Malformed(e.to_string()))
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait::async_trait]
impl IndexerClient for HttpIndexerClient {
    #[instrument(skip(self, body), fields(base_url = %self.base_url), err)]
    async fn perform_request(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> Result<Value, IndexerError> {
        self.send(method, url, body.as_ref()).await
    }

    #[instrument(skip(self, body), fields(base_url = %self.base_url), err)]
    async fn search(&self, index: &str, body: Value) -> Result<SearchResponse, IndexerError> {
        let raw = self
            .send(Method::Post, &format!("{index}/_search"), Some(&body))
            .await?;
        serde_json::from_value(raw)
            .map_err(|e| IndexerError::Malformed(format!("search response: {e}")))
    }
}
