//! User-Facing Errors
//!
//! Every failed action turns into one fixed message. The underlying
//! [`DomainError`](crate::domain::DomainError) is logged, never shown.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("Failed to add the todo.")]
    Create,
    #[error("Failed to update the todo.")]
    Update,
    #[error("Failed to delete the todo.")]
    Delete,
    #[error("Failed to reorder the todos.")]
    Reorder,
    #[error("Sign-in failed. Please try again.")]
    SignIn,
    #[error("Sign-out failed.")]
    SignOut,
}

/// Holds the error of the most recent action, if it failed
///
/// Clones share the same slot, so the gate and the list session of one
/// screen report into a single place.
#[derive(Clone)]
pub struct ErrorSlot(Arc<watch::Sender<Option<ActionError>>>);

impl Default for ErrorSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorSlot {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self(Arc::new(tx))
    }

    pub fn current(&self) -> Option<ActionError> {
        *self.0.borrow()
    }

    pub fn set(&self, error: ActionError) {
        self.0.send_replace(Some(error));
    }

    pub fn clear(&self) {
        self.0.send_if_modified(|slot| slot.take().is_some());
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ActionError>> {
        self.0.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(ActionError::Create.to_string(), "Failed to add the todo.");
        assert_eq!(ActionError::Reorder.to_string(), "Failed to reorder the todos.");
    }

    #[test]
    fn test_slot_keeps_latest_only() {
        let slot = ErrorSlot::new();
        let shared = slot.clone();

        slot.set(ActionError::Update);
        shared.set(ActionError::Delete);
        assert_eq!(slot.current(), Some(ActionError::Delete));

        shared.clear();
        assert_eq!(slot.current(), None);
    }
}
