//! `cmdindex-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! store-assigned identifiers, the entity abstraction and the domain error model.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CommandId, OrderId, RequestId};
