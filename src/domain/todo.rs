//! Todo Entity
//!
//! A single todo item owned by one user, ordered by `priority`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::identity::UserId;

/// Store-assigned document id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A todo item as delivered in a snapshot
///
/// Field names follow the document layout in the `todos` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    /// Unique identifier, assigned by the store
    pub id: TodoId,
    /// Item text content
    pub text: String,
    /// Completion status
    #[serde(default)]
    pub completed: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Owning user
    #[serde(rename = "userId")]
    pub owner_id: UserId,
    /// Display sort key; older documents without one sort first
    #[serde(default)]
    pub priority: i64,
}

impl TodoItem {
    /// Attach a store-assigned id to an insert payload
    pub fn from_new(id: TodoId, new: NewTodo) -> Self {
        Self {
            id,
            text: new.text,
            completed: new.completed,
            created_at: new.created_at,
            owner_id: new.owner_id,
            priority: new.priority,
        }
    }

    /// Apply a field update in place
    pub fn apply(&mut self, patch: &TodoPatch) {
        match *patch {
            TodoPatch::Completed(completed) => self.completed = completed,
            TodoPatch::Priority(priority) => self.priority = priority,
        }
    }
}

impl Entity for TodoItem {
    type Id = TodoId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Insert payload; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "userId")]
    pub owner_id: UserId,
    pub priority: i64,
}

impl NewTodo {
    /// A fresh, uncompleted item created now
    pub fn new(text: impl Into<String>, owner_id: UserId, priority: i64) -> Self {
        Self {
            text: text.into(),
            completed: false,
            created_at: Utc::now(),
            owner_id,
            priority,
        }
    }
}

/// Targeted single-field update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TodoPatch {
    Completed(bool),
    Priority(i64),
}
