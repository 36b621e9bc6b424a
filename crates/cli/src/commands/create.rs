//! Create command
//!
//! Usage: cmdindex create --source engine --target-type agent --target-id 001 --action restart

use clap::Args;
use serde_json::Value;

use cmdindex_commands::{Action, Command, Source, Target, TargetType};
use cmdindex_core::{OrderId, RequestId};
use cmdindex_infra::{CommandsIndex, IndexerClient};

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Originator: services, engine or content_manager
    #[arg(long)]
    pub source: Source,

    /// Kind of target: agent, group or server
    #[arg(long, default_value = "agent")]
    pub target_type: TargetType,

    #[arg(long)]
    pub target_id: String,

    /// Action name, e.g. restart
    #[arg(long)]
    pub action: String,

    /// Action argument (repeatable)
    #[arg(long = "arg", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Action version
    #[arg(long)]
    pub version: Option<String>,

    #[arg(long)]
    pub user: Option<String>,

    /// Seconds the target has to complete the command
    #[arg(long)]
    pub timeout: Option<u64>,

    #[arg(long)]
    pub request_id: Option<String>,

    #[arg(long)]
    pub order_id: Option<String>,
}

impl CreateArgs {
    pub fn into_command(self) -> anyhow::Result<Command> {
        let mut action = Action::new(self.action).with_args(self.args);
        if let Some(version) = self.version {
            action = action.with_version(version);
        }

        let target = Target::new(self.target_id, self.target_type);
        let mut command = Command::new(self.source, target).with_action(action);
        if let Some(user) = self.user {
            command = command.with_user(user);
        }
        if let Some(timeout) = self.timeout {
            command = command.with_timeout(timeout);
        }
        if let Some(request_id) = self.request_id {
            command = command.with_request_id(RequestId::new(request_id)?);
        }
        if let Some(order_id) = self.order_id {
            command = command.with_order_id(OrderId::new(order_id)?);
        }
        Ok(command)
    }
}

/// Execute create: store the command and return the acknowledgment.
pub async fn execute<C: IndexerClient>(
    index: &CommandsIndex<C>,
    args: CreateArgs,
) -> anyhow::Result<Value> {
    let command = args.into_command()?;
    let response = index.create(&command).await?;
    Ok(serde_json::to_value(response)?)
}
