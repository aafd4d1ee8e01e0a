//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has no knowledge of stores, providers or screens.

mod entity;
mod identity;
mod todo;

pub use entity::{DomainError, DomainResult, Entity};
pub use identity::{Identity, UserId};
pub use todo::{NewTodo, TodoId, TodoItem, TodoPatch};
