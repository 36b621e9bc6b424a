//! `cmdindex-commands`: the command model.
//!
//! A command is a unit of work addressed to a remote target (an agent, a group
//! of agents or a server). This crate defines the entity, its closed
//! vocabulary and the storage encoding used by the repository layer. It does
//! no IO.

pub mod command;
pub mod fields;
pub mod vocabulary;

pub use command::{Action, Command, Target};
pub use fields::prune_empty;
pub use vocabulary::{Source, Status, TargetType};
