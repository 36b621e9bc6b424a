//! List command
//!
//! Usage: cmdindex list [--target-id <ID>] [--status <STATUS>] [--limit <N>]

use clap::Args;
use serde_json::Value;

use cmdindex_commands::{Command, Status};
use cmdindex_core::Entity;
use cmdindex_infra::indexer::{CommandFilter, SearchRequest};
use cmdindex_infra::{CommandsIndex, IndexerClient};

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub target_id: Option<String>,

    /// pending, sent, success, failure or timeout
    #[arg(long)]
    pub status: Option<Status>,

    /// Maximum number of commands to return
    #[arg(long)]
    pub limit: Option<u32>,
}

impl ListArgs {
    pub fn to_request(&self) -> SearchRequest {
        let filter = CommandFilter::new(self.target_id.as_deref(), self.status);
        let request = SearchRequest::new(filter);
        match self.limit {
            Some(limit) => request.with_size(limit),
            None => request,
        }
    }
}

/// Stored fields of a command plus its document id under `id`.
fn render(command: &Command) -> anyhow::Result<Value> {
    let mut fields = command.to_storage_fields()?;
    if let Some(id) = command.id() {
        fields.insert("id".to_string(), Value::String(id.to_string()));
    }
    Ok(Value::Object(fields))
}

/// Execute list: run the filtered search and return the matches as an array.
pub async fn execute<C: IndexerClient>(
    index: &CommandsIndex<C>,
    args: ListArgs,
) -> anyhow::Result<Value> {
    let commands = index.search(args.to_request()).await?;
    tracing::debug!(count = commands.len(), "listed commands");

    let rendered = commands.iter().map(render).collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Value::Array(rendered))
}
