use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::{Map, Value, json};
use uuid::Uuid;

use super::query::{BOOL, MATCH, MATCH_ALL, MUST, QUERY, SIZE};
use super::{IndexerClient, IndexerError, Method, SearchHit, SearchHits, SearchResponse};

/// A request observed by [`InMemoryIndexerClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedRequest {
    Perform {
        method: Method,
        url: String,
        body: Option<Value>,
    },
    Search {
        index: String,
        body: Value,
    },
}

#[derive(Debug, Default)]
struct State {
    /// Documents per index, in insertion order.
    indices: HashMap<String, Vec<(String, Map<String, Value>)>>,
    requests: Vec<RecordedRequest>,
    fail_next_write: Option<IndexerError>,
    fail_next_read: Option<IndexerError>,
}

/// In-memory document store for tests/dev.
///
/// Understands `POST /{index}/_doc` plus any extra write endpoints registered
/// with [`with_route`](Self::with_route), and evaluates `match_all` and
/// `bool.must[match]` searches with exact-value matching over dotted paths.
/// Every request is recorded. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryIndexerClient {
    routes: HashMap<String, String>,
    state: RwLock<State>,
}

impl InMemoryIndexerClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `POST url` as a document write into `index`.
    pub fn with_route(mut self, url: impl Into<String>, index: impl Into<String>) -> Self {
        self.routes.insert(url.into(), index.into());
        self
    }

    /// Store a document directly, bypassing request recording.
    pub fn seed(
        &self,
        index: &str,
        id: impl Into<String>,
        source: Value,
    ) -> Result<(), IndexerError> {
        let source = into_object(source)?;
        let mut state = self.write_state()?;
        state
            .indices
            .entry(index.to_owned())
            .or_default()
            .push((id.into(), source));
        Ok(())
    }

    /// Make the next write request fail with `error`.
    pub fn fail_next_write(&self, error: IndexerError) {
        if let Ok(mut state) = self.state.write() {
            state.fail_next_write = Some(error);
        }
    }

    /// Make the next search fail with `error`.
    pub fn fail_next_read(&self, error: IndexerError) {
        if let Ok(mut state) = self.state.write() {
            state.fail_next_read = Some(error);
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .read()
            .map(|s| s.requests.clone())
            .unwrap_or_default()
    }

    pub fn documents(&self, index: &str) -> Vec<(String, Map<String, Value>)> {
        self.state
            .read()
            .ok()
            .and_then(|s| s.indices.get(index).cloned())
            .unwrap_or_default()
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, IndexerError> {
        self.state
            .write()
            .map_err(|_| IndexerError::Transport("lock poisoned".to_string()))
    }

    fn resolve_index(&self, url: &str) -> Option<String> {
        if let Some(index) = self.routes.get(url) {
            return Some(index.clone());
        }
        url.trim_start_matches('/')
            .strip_suffix("/_doc")
            .filter(|index| !index.is_empty() && !index.contains('/'))
            .map(str::to_owned)
    }
}

#[async_trait::async_trait]
impl IndexerClient for InMemoryIndexerClient {
    async fn perform_request(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> Result<Value, IndexerError> {
        let index = self.resolve_index(url);
        let mut state = self.write_state()?;
        state.requests.push(RecordedRequest::Perform {
            method,
            url: url.to_owned(),
            body: body.clone(),
        });

        if let Some(err) = state.fail_next_write.take() {
            return Err(err);
        }

        let index = match (method, index) {
            (Method::Post, Some(index)) => index,
            _ => {
                return Err(IndexerError::Status {
                    code: 404,
                    body: format!("no handler found for uri [{url}] and method [{method}]"),
                });
            }
        };

        let source = match body {
            Some(body) => into_object(body).map_err(|e| IndexerError::Status {
                code: 400,
                body: e.to_string(),
            })?,
            None => {
                return Err(IndexerError::Status {
                    code: 400,
                    body: "request body is required".to_string(),
                });
            }
        };

        let id = Uuid::now_v7().to_string();
        state
            .indices
            .entry(index.clone())
            .or_default()
            .push((id.clone(), source));

        Ok(json!({
            "_index": index,
            "_id": id,
            "result": "created",
            "status": 201,
        }))
    }

    async fn search(&self, index: &str, body: Value) -> Result<SearchResponse, IndexerError> {
        let mut state = self.write_state()?;
        state.requests.push(RecordedRequest::Search {
            index: index.to_owned(),
            body: body.clone(),
        });

        if let Some(err) = state.fail_next_read.take() {
            return Err(err);
        }

        let clauses = parse_clauses(&body)?;
        let size = body.get(SIZE).and_then(Value::as_u64).map(|n| n as usize);

        // An index nobody has written to yet behaves like an empty one.
        let hits = state
            .indices
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter(|(_, source)| {
                clauses
                    .iter()
                    .all(|(path, expected)| lookup(source, path) == Some(expected))
            })
            .take(size.unwrap_or(usize::MAX))
            .map(|(id, source)| SearchHit {
                id: id.clone(),
                source: source.clone(),
            })
            .collect();

        Ok(SearchResponse {
            hits: SearchHits { hits },
        })
    }
}

fn into_object(value: Value) -> Result<Map<String, Value>, IndexerError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(IndexerError::Malformed(format!(
            "document must be a JSON object, got {other}"
        ))),
    }
}

/// Extract `(path, value)` exact-match pairs from a search body.
fn parse_clauses(body: &Value) -> Result<Vec<(String, Value)>, IndexerError> {
    let query = body
        .get(QUERY)
        .ok_or_else(|| IndexerError::Malformed("search body has no query".to_string()))?;

    if query.get(MATCH_ALL).is_some() {
        return Ok(Vec::new());
    }

    let must = query
        .get(BOOL)
        .and_then(|b| b.get(MUST))
        .and_then(Value::as_array)
        .ok_or_else(|| IndexerError::Malformed(format!("unsupported query: {query}")))?;

    must.iter()
        .map(|clause| {
            clause
                .get(MATCH)
                .and_then(Value::as_object)
                .filter(|m| m.len() == 1)
                .and_then(|m| m.iter().next())
                .map(|(path, value)| (path.clone(), value.clone()))
                .ok_or_else(|| IndexerError::Malformed(format!("unsupported clause: {clause}")))
        })
        .collect()
}

fn lookup<'a>(source: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = source.get(segments.next()?)?;
    for segment in segments {
        current = current.get(segment)?;
    }
    Some(current)
}
