//! Integration tests for the producer → store → consumer path.
//!
//! Tests: Command → CommandsIndex::create → indexer → CommandsIndex::get → Command
//!
//! Verifies:
//! - Created commands come back intact when queried by target and status
//! - Filters only return the addressed target's commands
//! - Concurrent producers get distinct identifiers without coordination

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use cmdindex_commands::{Action, Command, Source, Status, Target, TargetType};
    use cmdindex_core::{CommandId, Entity, RequestId};

    use crate::commands_index::{COMMAND_MANAGER_PLUGIN_URL, COMMANDS_INDEX, CommandsIndex};
    use crate::indexer::{CommandFilter, InMemoryIndexerClient, RecordedRequest, SearchRequest};

    fn setup() -> (CommandsIndex<Arc<InMemoryIndexerClient>>, Arc<InMemoryIndexerClient>) {
        let client = Arc::new(
            InMemoryIndexerClient::new().with_route(COMMAND_MANAGER_PLUGIN_URL, COMMANDS_INDEX),
        );
        (CommandsIndex::new(client.clone()), client)
    }

    #[tokio::test]
    async fn engine_command_for_agent_is_discoverable_as_pending() {
        let (index, _client) = setup();
        let command = Command::new(Source::Engine, Target::agent("001"));

        let created = index.create(&command).await.unwrap();
        assert!(!created.document_id.as_str().is_empty());
        assert_eq!(command.status(), Status::Pending);

        let pending = index.get(Some("001"), Some(Status::Pending)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].target().id, "001");
        assert_eq!(pending[0].id(), Some(&created.document_id));
    }

    #[tokio::test]
    async fn filter_on_target_excludes_other_targets() {
        let (index, _client) = setup();
        index
            .create(&Command::new(Source::Engine, Target::agent("a")))
            .await
            .unwrap();
        index
            .create(&Command::new(Source::Engine, Target::agent("b")))
            .await
            .unwrap();

        let for_a = index.get(Some("a"), Some(Status::Pending)).await.unwrap();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].target().id, "a");

        let all_pending = index.get(None, Some(Status::Pending)).await.unwrap();
        assert_eq!(all_pending.len(), 2);
    }

    #[tokio::test]
    async fn round_trip_preserves_target_source_and_status() {
        let (index, _client) = setup();
        let commands = vec![
            Command::new(Source::Engine, Target::agent("001")),
            Command::new(Source::Services, Target::new("web", TargetType::Group))
                .with_user("admin")
                .with_action(Action::new("restart").with_args(["--graceful"])),
            Command::new(Source::ContentManager, Target::new("master", TargetType::Server))
                .with_request_id(RequestId::new("req-7").unwrap())
                .with_timeout(60),
        ];

        for command in &commands {
            index.create(command).await.unwrap();
        }

        for command in &commands {
            let found = index
                .get(Some(&command.target().id), Some(command.status()))
                .await
                .unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].target(), command.target());
            assert_eq!(found[0].source, command.source);
            assert_eq!(found[0].status(), command.status());
            assert_eq!(found[0].action, command.action);
            assert_eq!(found[0].request_id, command.request_id);
        }
    }

    #[tokio::test]
    async fn stored_documents_carry_no_empty_placeholders() {
        let (index, client) = setup();
        index
            .create(&Command::new(Source::Engine, Target::agent("001")))
            .await
            .unwrap();

        let docs = client.documents(COMMANDS_INDEX);
        assert_eq!(docs.len(), 1);
        let (_, source) = &docs[0];
        for key in ["action", "user", "timeout", "result", "request_id", "order_id"] {
            assert!(!source.contains_key(key), "unexpected key {key} in {source:?}");
        }
    }

    #[tokio::test]
    async fn status_only_filter_sends_a_single_clause() {
        let (index, client) = setup();
        index.get(None, Some(Status::Sent)).await.unwrap();

        let requests = client.requests();
        let RecordedRequest::Search { body, .. } = &requests[0] else {
            panic!("expected a search, got {requests:?}");
        };
        let must = body["query"]["bool"]["must"].as_array().unwrap();
        assert_eq!(must.len(), 1);
        assert!(must[0]["match"].get("target.id").is_none());
    }

    #[tokio::test]
    async fn many_pending_commands_per_target_are_allowed() {
        let (index, _client) = setup();
        for _ in 0..3 {
            index
                .create(&Command::new(Source::Engine, Target::agent("001")))
                .await
                .unwrap();
        }

        let pending = index.get_pending("001").await.unwrap();
        assert_eq!(pending.len(), 3);

        let first_two = index
            .search(SearchRequest::new(CommandFilter::default().target("001")).with_size(2))
            .await
            .unwrap();
        assert_eq!(first_two.len(), 2);
        assert_eq!(first_two[0].id(), pending[0].id(), "store order is preserved");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_producers_receive_distinct_ids() {
        let (index, _client) = setup();
        let index = Arc::new(index);

        let mut handles = Vec::new();
        for i in 0..32 {
            let index = index.clone();
            handles.push(tokio::spawn(async move {
                let target = Target::agent(format!("agent-{}", i % 4));
                index.create(&Command::new(Source::Engine, target)).await
            }));
        }

        let mut ids: HashSet<CommandId> = HashSet::new();
        for handle in handles {
            let created = handle.await.unwrap().unwrap();
            assert!(ids.insert(created.document_id), "identifiers must be unique");
        }
        assert_eq!(ids.len(), 32);

        let for_agent_0 = index.get_pending("agent-0").await.unwrap();
        assert_eq!(for_agent_0.len(), 8);
    }
}
