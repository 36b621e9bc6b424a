//! Commands repository.
//!
//! `CommandsIndex` mediates between producers/consumers of commands and the
//! document store:
//!
//! ```text
//! create(command)     ─► validate ─► to_storage_fields ─► POST <create endpoint>
//! get(target, status) ─► CommandFilter::to_query ─► search <index> ─► from_stored
//! ```
//!
//! The repository is stateless between calls and never retries; every store
//! fault reaches the caller unchanged. Status transitions are not its
//! business: consumers advance commands elsewhere and use `get` to discover
//! pending work.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{Span, debug, instrument};

use cmdindex_commands::{Command, Status};
use cmdindex_core::{CommandId, DomainError};

use crate::indexer::{CommandFilter, IndexerClient, IndexerError, Method, SearchRequest};

/// Endpoint of the command manager integration that accepts new commands.
pub const COMMAND_MANAGER_PLUGIN_URL: &str = "/_plugins/_command_manager/commands";

/// Index holding stored commands.
pub const COMMANDS_INDEX: &str = ".commands";

/// Where commands are written and where they are searched.
///
/// Creation goes through the command manager integration, retrieval through
/// the plain index; both are fixed when the repository is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandsIndexPaths {
    pub create_endpoint: String,
    pub index: String,
}

impl Default for CommandsIndexPaths {
    fn default() -> Self {
        Self {
            create_endpoint: COMMAND_MANAGER_PLUGIN_URL.to_string(),
            index: COMMANDS_INDEX.to_string(),
        }
    }
}

/// Acknowledgment of a successful `create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCommandResponse {
    pub index: String,
    pub document_id: CommandId,
    pub result: String,
    pub status: u16,
}

/// Raw acknowledgment body returned by the store.
#[derive(Debug, Deserialize)]
struct Acknowledgment {
    #[serde(rename = "_index")]
    index: Option<String>,
    #[serde(rename = "_id")]
    id: Option<String>,
    result: Option<String>,
    status: Option<u16>,
}

/// Commands repository error.
///
/// ## Error Categories
///
/// - **Validation**: the command was rejected before any store call
/// - **Write**: the store failed or refused a create request
/// - **Read**: the store failed to run a search (an empty result is not an error)
/// - **Decoding**: a stored document or acknowledgment could not be understood
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandsIndexError {
    #[error("invalid command: {0}")]
    Validation(String),

    #[error("command write failed: {0}")]
    Write(IndexerError),

    #[error("command read failed: {0}")]
    Read(IndexerError),

    #[error("stored command could not be decoded: {0}")]
    Decoding(String),
}

impl From<DomainError> for CommandsIndexError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Decoding(msg) => CommandsIndexError::Decoding(msg),
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                CommandsIndexError::Validation(msg)
            }
            other @ DomainError::InvalidTransition { .. } => {
                CommandsIndexError::Validation(other.to_string())
            }
        }
    }
}

/// Create/query access to stored commands over an injected store client.
///
/// Holds no mutable state: share one instance across tasks or build as many
/// as needed over the same client.
#[derive(Debug, Clone)]
pub struct CommandsIndex<C> {
    client: C,
    paths: CommandsIndexPaths,
}

impl<C> CommandsIndex<C> {
    pub fn new(client: C) -> Self {
        Self::with_paths(client, CommandsIndexPaths::default())
    }

    pub fn with_paths(client: C, paths: CommandsIndexPaths) -> Self {
        Self { client, paths }
    }

    pub fn paths(&self) -> &CommandsIndexPaths {
        &self.paths
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }
}

impl<C> CommandsIndex<C>
where
    C: IndexerClient,
{
    /// Persist a new command and return the store's acknowledgment.
    ///
    /// The command must have a source and must not have been persisted
    /// already. Exactly one write is issued.
    #[instrument(
        skip(self, command),
        fields(
            target_id = %command.target().id,
            target_type = %command.target().kind,
            document_id
        ),
        err
    )]
    pub async fn create(
        &self,
        command: &Command,
    ) -> Result<CreateCommandResponse, CommandsIndexError> {
        command.validate_for_create()?;
        let fields = command.to_storage_fields()?;

        let raw = self
            .client
            .perform_request(
                Method::Post,
                &self.paths.create_endpoint,
                Some(Value::Object(fields)),
            )
            .await
            .map_err(CommandsIndexError::Write)?;

        let response = self.decode_acknowledgment(raw)?;
        Span::current().record("document_id", response.document_id.as_str());
        Ok(response)
    }

    /// Commands matching every supplied criterion, in store order.
    ///
    /// One undecodable document fails the whole call.
    #[instrument(skip(self), fields(index = %self.paths.index, hits), err)]
    pub async fn get(
        &self,
        target_id: Option<&str>,
        status: Option<Status>,
    ) -> Result<Vec<Command>, CommandsIndexError> {
        self.search(SearchRequest::new(CommandFilter::new(target_id, status)))
            .await
    }

    /// Pending commands addressed to `target_id`.
    pub async fn get_pending(&self, target_id: &str) -> Result<Vec<Command>, CommandsIndexError> {
        self.get(Some(target_id), Some(Status::Pending)).await
    }

    /// Run an arbitrary filtered search, e.g. with a page size.
    pub async fn search(&self, request: SearchRequest) -> Result<Vec<Command>, CommandsIndexError> {
        let response = self
            .client
            .search(&self.paths.index, request.to_body())
            .await
            .map_err(CommandsIndexError::Read)?;

        let hits = response.into_hits();
        Span::current().record("hits", hits.len());

        hits.into_iter()
            .map(|hit| {
                let id = CommandId::new(hit.id).map_err(|e| {
                    CommandsIndexError::Decoding(format!("search hit without usable _id: {e}"))
                })?;
                Command::from_stored(id, hit.source).map_err(CommandsIndexError::from)
            })
            .collect()
    }

    fn decode_acknowledgment(
        &self,
        raw: Value,
    ) -> Result<CreateCommandResponse, CommandsIndexError> {
        let ack: Acknowledgment = serde_json::from_value(raw)
            .map_err(|e| CommandsIndexError::Decoding(format!("create acknowledgment: {e}")))?;

        let id = ack.id.ok_or_else(|| {
            CommandsIndexError::Decoding("create acknowledgment has no _id".to_string())
        })?;
        let document_id = CommandId::new(id)
            .map_err(|e| CommandsIndexError::Decoding(format!("create acknowledgment: {e}")))?;

        debug!(document_id = %document_id, "command stored");

        Ok(CreateCommandResponse {
            index: ack.index.unwrap_or_else(|| self.paths.index.clone()),
            document_id,
            result: ack.result.unwrap_or_else(|| "created".to_string()),
            status: ack.status.unwrap_or(201),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use cmdindex_commands::{Action, Source, Target, TargetType};
    use cmdindex_core::Entity;

    use super::*;
    use crate::indexer::{InMemoryIndexerClient, RecordedRequest};

    fn client() -> Arc<InMemoryIndexerClient> {
        Arc::new(
            InMemoryIndexerClient::new().with_route(COMMAND_MANAGER_PLUGIN_URL, COMMANDS_INDEX),
        )
    }

    /// Stored body of a pending command, as another producer would have written it.
    fn pending_doc(target_id: &str, target_type: &str) -> Value {
        json!({"target": {"id": target_id, "type": target_type}, "status": "pending"})
    }

    #[tokio::test]
    async fn create_posts_pruned_body_to_command_manager() {
        let client = client();
        let index = CommandsIndex::new(client.clone());
        let command = Command::new(Source::Engine, Target::agent("001"));

        let response = index.create(&command).await.unwrap();

        assert_eq!(response.index, COMMANDS_INDEX);
        assert_eq!(response.result, "created");
        assert!(!response.document_id.as_str().is_empty());
        assert_eq!(
            client.requests(),
            vec![RecordedRequest::Perform {
                method: Method::Post,
                url: COMMAND_MANAGER_PLUGIN_URL.to_string(),
                body: Some(json!({
                    "source": "Engine",
                    "target": {"id": "001", "type": "agent"},
                    "status": "pending",
                })),
            }]
        );
    }

    #[tokio::test]
    async fn create_rejects_commands_without_source() {
        let client = client();
        let index = CommandsIndex::new(client.clone());

        let err = index
            .create(&Command::unsourced(Target::agent("001")))
            .await
            .unwrap_err();

        assert!(matches!(err, CommandsIndexError::Validation(_)));
        assert!(client.requests().is_empty(), "validation must happen before any store call");
    }

    #[tokio::test]
    async fn create_surfaces_store_rejection_verbatim() {
        let client = client();
        let rejection = IndexerError::Status {
            code: 400,
            body: "mapper_parsing_exception".to_string(),
        };
        client.fail_next_write(rejection.clone());
        let index = CommandsIndex::new(client.clone());

        let err = index
            .create(&Command::new(Source::Services, Target::agent("001")))
            .await
            .unwrap_err();

        assert_eq!(err, CommandsIndexError::Write(rejection));
        assert_eq!(client.requests().len(), 1, "no internal retry");
    }

    #[tokio::test]
    async fn get_queries_commands_index_and_decodes_hits() {
        let client = client();
        let uuid = "0191dd54-bd16-7025-80e6-ae49bc101c7a";
        client
            .seed(COMMANDS_INDEX, "pBjePGfvgm", pending_doc(uuid, "agent"))
            .unwrap();
        client
            .seed(COMMANDS_INDEX, "pBjePGfvgn", pending_doc("001", "agent"))
            .unwrap();
        let index = CommandsIndex::new(client.clone());

        let result = index.get(Some(uuid), Some(Status::Pending)).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id().map(CommandId::as_str), Some("pBjePGfvgm"));
        assert_eq!(result[0].target().id, uuid);
        assert_eq!(
            client.requests(),
            vec![RecordedRequest::Search {
                index: COMMANDS_INDEX.to_string(),
                body: json!({"query": {"bool": {"must": [
                    {"match": {"target.id": uuid}},
                    {"match": {"status": "pending"}},
                ]}}}),
            }]
        );
    }

    #[tokio::test]
    async fn get_with_no_matches_is_empty_not_error() {
        let index = CommandsIndex::new(client());
        let result = index.get(Some("nobody"), Some(Status::Pending)).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn get_fails_whole_call_on_corrupt_document() {
        let client = client();
        client
            .seed(COMMANDS_INDEX, "good", pending_doc("a", "agent"))
            .unwrap();
        client
            .seed(COMMANDS_INDEX, "bad", pending_doc("a", "fridge"))
            .unwrap();
        let index = CommandsIndex::new(client);

        let err = index.get(Some("a"), None).await.unwrap_err();
        assert!(matches!(err, CommandsIndexError::Decoding(msg) if msg.contains("bad")));
    }

    #[tokio::test]
    async fn get_surfaces_read_failures() {
        let client = client();
        client.fail_next_read(IndexerError::Transport("connection refused".to_string()));
        let index = CommandsIndex::new(client);

        let err = index.get(None, Some(Status::Pending)).await.unwrap_err();
        assert_eq!(
            err,
            CommandsIndexError::Read(IndexerError::Transport("connection refused".to_string()))
        );
    }

    #[tokio::test]
    async fn custom_paths_are_used_for_both_operations() {
        let paths = CommandsIndexPaths {
            create_endpoint: "/staging-commands/_doc".to_string(),
            index: "staging-commands".to_string(),
        };
        let client = Arc::new(InMemoryIndexerClient::new());
        let index = CommandsIndex::with_paths(client.clone(), paths);

        let command = Command::new(Source::ContentManager, Target::new("srv-1", TargetType::Server))
            .with_action(Action::new("update-content").with_version("5.0.0"));
        let created = index.create(&command).await.unwrap();
        let found = index.get(Some("srv-1"), None).await.unwrap();

        assert_eq!(created.index, "staging-commands");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].action, command.action);
    }

    #[tokio::test]
    async fn acknowledgment_without_id_is_a_decoding_error() {
        struct NoIdClient;

        #[async_trait::async_trait]
        impl IndexerClient for NoIdClient {
            async fn perform_request(
                &self,
                _method: Method,
                _url: &str,
                _body: Option<Value>,
            ) -> Result<Value, IndexerError> {
                Ok(json!({"result": "created"}))
            }

            async fn search(
                &self,
                _index: &str,
                _body: Value,
            ) -> Result<crate::indexer::SearchResponse, IndexerError> {
                Ok(Default::default())
            }
        }

        let index = CommandsIndex::new(NoIdClient);
        let err = index
            .create(&Command::new(Source::Engine, Target::agent("001")))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandsIndexError::Decoding(_)));
    }

    #[test]
    fn domain_errors_map_to_repository_categories() {
        assert_eq!(
            CommandsIndexError::from(DomainError::decoding("x")),
            CommandsIndexError::Decoding("x".to_string())
        );
        assert_eq!(
            CommandsIndexError::from(DomainError::validation("y")),
            CommandsIndexError::Validation("y".to_string())
        );
    }
}
