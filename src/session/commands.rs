//! List Commands
//!
//! Create / toggle / delete / reorder. Each handler clears the previous error,
//! issues its writes and waits for them; the view itself only changes when
//! the live query delivers the next snapshot.

use futures::future::join_all;

use super::ListSession;
use crate::domain::{DomainError, NewTodo, TodoId, TodoPatch};
use crate::error::ActionError;
use crate::reorder::{next_priority, plan_move, DragResult};

impl ListSession {
    /// Add the draft as a new item at the end of the list.
    ///
    /// A blank draft is ignored: `Ok(None)`, no write, nothing cleared.
    pub async fn create(&self) -> Result<Option<TodoId>, ActionError> {
        let (text, priority) = {
            let view = self.view.borrow();
            if !view.can_submit() {
                return Ok(None);
            }
            (view.draft.clone(), next_priority(&view.items))
        };
        self.errors.clear();

        let new = NewTodo::new(text, self.owner.clone(), priority);
        match self.store.insert(new).await {
            Ok(id) => {
                log::info!("Todo {} created at priority {}", id, priority);
                self.view.send_modify(|view| view.draft.clear());
                self.errors.clear();
                Ok(Some(id))
            }
            Err(e) => {
                self.report(ActionError::Create, &e);
                Err(ActionError::Create)
            }
        }
    }

    /// Flip `completed` relative to what is currently displayed
    pub async fn toggle(&self, id: &TodoId) -> Result<(), ActionError> {
        self.errors.clear();

        let current = self.view.borrow().find(id).map(|item| item.completed);
        let result = match current {
            Some(completed) => self.store.update(id, TodoPatch::Completed(!completed)).await,
            None => Err(DomainError::NotFound(format!("Todo {} is not displayed", id))),
        };

        result.map_err(|e| {
            self.report(ActionError::Update, &e);
            ActionError::Update
        })
    }

    pub async fn delete(&self, id: &TodoId) -> Result<(), ActionError> {
        self.errors.clear();

        self.store.delete(id).await.map_err(|e| {
            self.report(ActionError::Delete, &e);
            ActionError::Delete
        })
    }

    /// Apply a finished drag gesture. Returns the number of writes issued.
    ///
    /// All writes run concurrently and are awaited together. Writes that
    /// committed stay committed when another one fails.
    pub async fn reorder(&self, drag: DragResult) -> Result<usize, ActionError> {
        let Some(destination) = drag.destination else {
            return Ok(0);
        };

        let plan = {
            let view = self.view.borrow();
            plan_move(&view.items, drag.source, destination)
        };
        let Some(plan) = plan else {
            log::warn!(
                "Ignoring drag {} -> {}: outside the displayed list",
                drag.source,
                destination
            );
            return Ok(0);
        };
        self.errors.clear();

        let results = join_all(
            plan.iter()
                .map(|update| self.store.update(&update.id, TodoPatch::Priority(update.to))),
        )
        .await;

        let mut first_error = None;
        for (update, result) in plan.iter().zip(results) {
            if let Err(e) = result {
                log::warn!("Priority write {} ({} -> {}) failed: {}", update.id, update.from, update.to, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => {
                self.report(ActionError::Reorder, &e);
                Err(ActionError::Reorder)
            }
            None => Ok(plan.len()),
        }
    }
}
