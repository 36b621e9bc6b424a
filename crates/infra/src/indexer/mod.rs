//! Document store ("indexer") client boundary.
//!
//! The repository layer only needs two operations from the store: a raw
//! request against an arbitrary endpoint, and a search against a named index.
//! Everything else about the store (replication, durability, query execution)
//! stays on the other side of this trait.

pub mod http;
pub mod in_memory;
pub mod query;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use http::HttpIndexerClient;
pub use in_memory::{InMemoryIndexerClient, RecordedRequest};
pub use query::{CommandFilter, SearchRequest};

/// HTTP method of a raw store request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl core::fmt::Display for Method {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search response envelope: `{"hits": {"hits": [{"_id", "_source"}, ...]}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: SearchHits,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHits {
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

/// A single matching document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_source", default)]
    pub source: Map<String, Value>,
}

impl SearchResponse {
    pub fn into_hits(self) -> Vec<SearchHit> {
        self.hits.hits
    }
}

/// Store client error.
///
/// Empty search results are not errors; these variants only describe calls
/// that did not produce a usable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexerError {
    /// The request never got a response (connection refused, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The store answered with a non-success status.
    #[error("indexer returned status {code}: {body}")]
    Status { code: u16, body: String },

    /// The store answered, but the body was not what the protocol promises.
    #[error("malformed indexer response: {0}")]
    Malformed(String),
}

/// Narrow transport-and-query contract over the document store.
///
/// Implementations must be safe to share between concurrent callers and must
/// not retry on their own unless that is their documented policy; callers of
/// this trait surface every error as-is.
#[async_trait::async_trait]
pub trait IndexerClient: Send + Sync {
    /// Issue a raw request against `url` (a path relative to the store root).
    async fn perform_request(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> Result<Value, IndexerError>;

    /// Run a search `body` against `index`.
    async fn search(&self, index: &str, body: Value) -> Result<SearchResponse, IndexerError>;
}

#[async_trait::async_trait]
impl<C> IndexerClient for Arc<C>
where
    C: IndexerClient + ?Sized,
{
    async fn perform_request(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> Result<Value, IndexerError> {
        (**self).perform_request(method, url, body).await
    }

    async fn search(&self, index: &str, body: Value) -> Result<SearchResponse, IndexerError> {
        (**self).search(index, body).await
    }
}
