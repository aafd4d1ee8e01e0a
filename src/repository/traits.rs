//! Repository Layer - Core Traits
//!
//! Defines the abstract interface of the document store holding todo items.
//! Implementations can be a hosted document database, in-memory, etc.

use async_trait::async_trait;

use crate::domain::{DomainResult, NewTodo, TodoId, TodoItem, TodoPatch, UserId};
use crate::subscription::{Callback, Subscription};

/// Callback receiving a complete, ordered result set
pub type SnapshotCallback = Callback<Vec<TodoItem>>;

/// Live query over one owner's items, ordered by ascending priority
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoQuery {
    pub owner_id: UserId,
}

impl TodoQuery {
    pub fn for_owner(owner_id: UserId) -> Self {
        Self { owner_id }
    }

    /// Equality filter on the owner field
    pub fn matches(&self, item: &TodoItem) -> bool {
        item.owner_id == self.owner_id
    }

    /// Filter and order `items`. Equal priorities keep their input order.
    pub fn select<'a>(&self, items: impl IntoIterator<Item = &'a TodoItem>) -> Vec<TodoItem> {
        let mut selected: Vec<TodoItem> = items
            .into_iter()
            .filter(|item| self.matches(item))
            .cloned()
            .collect();
        selected.sort_by_key(|item| item.priority);
        selected
    }
}

/// Document store for todo items
///
/// Writes are independent point operations; no batch atomicity is assumed.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Start a live query. The current result set is delivered first, then a
    /// fresh snapshot after every matching change, until the handle is dropped.
    ///
    /// Snapshots are delivered on a spawned task, so this must be called from
    /// within a tokio runtime; outside one it panics.
    fn subscribe(&self, query: TodoQuery, on_snapshot: SnapshotCallback) -> DomainResult<Subscription>;

    /// Insert a new document; returns the assigned id
    async fn insert(&self, todo: NewTodo) -> DomainResult<TodoId>;

    /// Update a single field of an existing document
    async fn update(&self, id: &TodoId, patch: TodoPatch) -> DomainResult<()>;

    /// Delete a document by id
    async fn delete(&self, id: &TodoId) -> DomainResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewTodo;

    fn item(id: &str, owner: &str, priority: i64) -> TodoItem {
        TodoItem::from_new(TodoId::new(id), NewTodo::new(id, UserId::new(owner), priority))
    }

    #[test]
    fn test_select_filters_and_orders() {
        let items = vec![
            item("a", "u1", 3),
            item("b", "u2", 1),
            item("c", "u1", 1),
            item("d", "u1", 2),
        ];
        let query = TodoQuery::for_owner(UserId::new("u1"));
        let ids: Vec<_> = query.select(&items).into_iter().map(|i| i.id.to_string()).collect();
        assert_eq!(ids, vec!["c", "d", "a"]);
    }

    #[test]
    fn test_select_keeps_ties_stable() {
        let items = vec![item("x", "u1", 2), item("y", "u1", 2), item("z", "u1", 1)];
        let query = TodoQuery::for_owner(UserId::new("u1"));
        let ids: Vec<_> = query.select(&items).into_iter().map(|i| i.id.to_string()).collect();
        assert_eq!(ids, vec!["z", "x", "y"]);
    }
}
