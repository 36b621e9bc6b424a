//! Storage encoding of commands.
//!
//! Writes go through [`Command::to_storage_fields`], which strips every empty
//! value so a partial document never overwrites stored fields with `null`.
//! Reads go through [`Command::from_stored`].

use serde_json::{Map, Value};

use cmdindex_core::{CommandId, DomainError, DomainResult};

use crate::command::Command;

/// Dotted path of the target identifier inside a stored command.
pub const TARGET_ID_KEY: &str = "target.id";

/// Path of the lifecycle status inside a stored command.
pub const STATUS_KEY: &str = "status";

/// Remove `null`, empty strings, empty arrays and empty objects from every
/// object in `value`, recursively. Array elements are kept in place (their
/// position is meaningful) but objects inside arrays are pruned too.
///
/// Returns `true` when `value` itself is empty after pruning.
pub fn prune_empty(value: &mut Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => {
            for item in items.iter_mut() {
                if item.is_object() {
                    prune_empty(item);
                }
            }
            items.is_empty()
        }
        Value::Object(map) => {
            map.retain(|_, v| !prune_empty(v));
            map.is_empty()
        }
        Value::Bool(_) | Value::Number(_) => false,
    }
}

impl Command {
    /// Field map to write to the store, with unset/empty fields omitted.
    pub fn to_storage_fields(&self) -> DomainResult<Map<String, Value>> {
        let mut value = serde_json::to_value(self)
            .map_err(|e| DomainError::validation(format!("command serialization failed: {e}")))?;
        prune_empty(&mut value);

        match value {
            Value::Object(map) => Ok(map),
            other => Err(DomainError::validation(format!(
                "command serialized to a non-object: {other}"
            ))),
        }
    }

    /// Rebuild a command from a store identifier and its stored fields.
    ///
    /// Optional fields absent from `fields` (or stored as `null`) stay unset;
    /// a missing `status` means the command was never advanced and decodes as
    /// `Pending`. A missing target, or any enumerated value outside its
    /// vocabulary, is a decoding error.
    ///
    /// `source` is only enforced on write (`validate_for_create`). Documents
    /// written by other producers may carry just `target` and `status`, and
    /// consumers still need to see them.
    pub fn from_stored(id: CommandId, mut fields: Map<String, Value>) -> DomainResult<Command> {
        // A stored `null` means the same as an absent key.
        fields.retain(|_, v| !v.is_null());

        if !fields.contains_key("target") {
            return Err(DomainError::decoding(format!(
                "document '{id}': missing required field 'target'"
            )));
        }

        let mut command: Command = serde_json::from_value(Value::Object(fields))
            .map_err(|e| DomainError::decoding(format!("document '{id}': {e}")))?;
        command.id = Some(id);
        Ok(command)
    }
}
