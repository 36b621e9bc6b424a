//! Translation of command filters into the store's structured query language.
//!
//! Pure and deterministic: identical filters produce identical bodies, with
//! clauses always emitted in the same order (target, then status).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use cmdindex_commands::Status;
use cmdindex_commands::fields::{STATUS_KEY, TARGET_ID_KEY};

pub const QUERY: &str = "query";
pub const BOOL: &str = "bool";
pub const MUST: &str = "must";
pub const MATCH: &str = "match";
pub const MATCH_ALL: &str = "match_all";
pub const SIZE: &str = "size";

/// Optional criteria for selecting stored commands. Supplied criteria are
/// combined with AND; omitted ones add no clause.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandFilter {
    pub target_id: Option<String>,
    pub status: Option<Status>,
}

impl CommandFilter {
    pub fn new(target_id: Option<&str>, status: Option<Status>) -> Self {
        Self {
            target_id: target_id.map(str::to_owned),
            status,
        }
    }

    pub fn target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.target_id.is_none() && self.status.is_none()
    }

    /// Exact-match clauses for every supplied criterion.
    pub fn clauses(&self) -> Vec<Value> {
        let mut clauses = Vec::with_capacity(2);
        if let Some(target_id) = &self.target_id {
            clauses.push(match_clause(TARGET_ID_KEY, json!(target_id)));
        }
        if let Some(status) = self.status {
            clauses.push(match_clause(STATUS_KEY, json!(status)));
        }
        clauses
    }

    /// `{"query": {"bool": {"must": [...]}}}`, or `match_all` when no
    /// criterion was supplied.
    pub fn to_query(&self) -> Value {
        let clauses = self.clauses();
        let query = if clauses.is_empty() {
            json!({ MATCH_ALL: {} })
        } else {
            json!({ BOOL: { MUST: clauses } })
        };
        json!({ QUERY: query })
    }
}

fn match_clause(field: &str, value: Value) -> Value {
    let mut inner = Map::with_capacity(1);
    inner.insert(field.to_owned(), value);
    json!({ MATCH: inner })
}

/// A full search body: filter plus an optional page size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub filter: CommandFilter,
    pub size: Option<u32>,
}

impl SearchRequest {
    pub fn new(filter: CommandFilter) -> Self {
        Self { filter, size: None }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn to_body(&self) -> Value {
        let mut body = self.filter.to_query();
        if let (Some(size), Value::Object(map)) = (self.size, &mut body) {
            map.insert(SIZE.to_owned(), json!(size));
        }
        body
    }
}
