//! The command entity.

use serde::{Deserialize, Serialize};

use cmdindex_core::{CommandId, DomainError, DomainResult, Entity, OrderId, RequestId};

use crate::vocabulary::{Source, Status, TargetType};

/// Addressable recipient of a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TargetType,
}

impl Target {
    pub fn new(id: impl Into<String>, kind: TargetType) -> Self {
        Self { id: id.into(), kind }
    }

    pub fn agent(id: impl Into<String>) -> Self {
        Self::new(id, TargetType::Agent)
    }
}

/// Work the target is asked to perform. Opaque to the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            version: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// A unit of work dispatched to a remote target.
///
/// `id` is never part of the stored body: the store keeps it in the document
/// `_id` and hands it back alongside the fields on reads.
///
/// Unset optional fields serialize as `null` here; the storage encoding in
/// [`crate::fields`] strips them before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(skip)]
    pub(crate) id: Option<CommandId>,
    #[serde(default)]
    pub request_id: Option<RequestId>,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub source: Option<Source>,
    #[serde(default)]
    pub user: Option<String>,
    target: Target,
    #[serde(default)]
    pub action: Option<Action>,
    /// Seconds after which an undelivered command expires.
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    status: Status,
    #[serde(default)]
    pub result: Option<String>,
}

impl Command {
    /// A new, unpersisted command in the `Pending` state.
    pub fn new(source: Source, target: Target) -> Self {
        Self::unsourced(target).with_source(source)
    }

    /// A command with no source yet. `create` rejects it until one is set.
    pub fn unsourced(target: Target) -> Self {
        Self {
            id: None,
            request_id: None,
            order_id: None,
            source: None,
            user: None,
            target,
            action: None,
            timeout: None,
            status: Status::Pending,
            result: None,
        }
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Attach the store-assigned identifier. Only allowed once.
    pub fn assign_id(&mut self, id: CommandId) -> DomainResult<()> {
        match &self.id {
            Some(existing) if *existing != id => Err(DomainError::invalid_id(format!(
                "command already has id '{existing}', refusing '{id}'"
            ))),
            _ => {
                self.id = Some(id);
                Ok(())
            }
        }
    }

    /// Move the lifecycle forward. Backwards moves and moves out of a
    /// terminal state are rejected.
    pub fn advance(&mut self, next: Status) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invalid_transition(self.status, next));
        }
        self.status = next;
        Ok(())
    }

    /// Checks a producer must pass before the command is written.
    pub fn validate_for_create(&self) -> DomainResult<()> {
        if self.id.is_some() {
            return Err(DomainError::validation(
                "command already has a store-assigned id",
            ));
        }
        if self.source.is_none() {
            return Err(DomainError::validation("command source is required"));
        }
        if self.target.id.trim().is_empty() {
            return Err(DomainError::validation("command target id is required"));
        }
        if let Some(action) = &self.action {
            if action.name.trim().is_empty() {
                return Err(DomainError::validation("command action name is required"));
            }
        }
        Ok(())
    }
}

impl Entity for Command {
    type Id = CommandId;

    fn id(&self) -> Option<&CommandId> {
        self.id.as_ref()
    }
}
