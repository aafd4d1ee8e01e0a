//! List Session
//!
//! View model of one user's list screen. The live query is the only writer of
//! the item list: every snapshot replaces it wholesale, and command handlers
//! only read it. Created when the list screen mounts, torn down on unmount.

mod commands;


use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::{DomainResult, TodoId, TodoItem, UserId};
use crate::error::{ActionError, ErrorSlot};
use crate::repository::{TodoQuery, TodoStore};
use crate::subscription::Subscription;

/// Everything the list screen renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListView {
    /// Latest snapshot, ascending priority
    pub items: Vec<TodoItem>,
    /// Text in the new-todo input
    pub draft: String,
    /// Whether the first snapshot has arrived
    pub loaded: bool,
}

impl ListView {
    /// The add action is only offered for non-blank input
    pub fn can_submit(&self) -> bool {
        !self.draft.trim().is_empty()
    }

    pub fn find(&self, id: &TodoId) -> Option<&TodoItem> {
        self.items.iter().find(|item| &item.id == id)
    }
}

pub struct ListSession {
    owner: UserId,
    store: Arc<dyn TodoStore>,
    view: Arc<watch::Sender<ListView>>,
    errors: ErrorSlot,
    subscription: Option<Subscription>,
}

impl ListSession {
    /// Mount the list screen for `owner` with its own error slot.
    ///
    /// Must be called from within a tokio runtime; the live query delivers
    /// on a spawned task and panics without one.
    pub fn mount(store: Arc<dyn TodoStore>, owner: UserId) -> DomainResult<Self> {
        Self::mount_with_errors(store, owner, ErrorSlot::new())
    }

    /// Mount the list screen reporting into a shared error slot. Same runtime
    /// requirement as [`ListSession::mount`].
    pub fn mount_with_errors(store: Arc<dyn TodoStore>, owner: UserId, errors: ErrorSlot) -> DomainResult<Self> {
        let (view, _) = watch::channel(ListView::default());
        let view = Arc::new(view);

        let sink = Arc::clone(&view);
        let subscription = store.subscribe(
            TodoQuery::for_owner(owner.clone()),
            Box::new(move |items| {
                sink.send_modify(|view| {
                    view.items = items;
                    view.loaded = true;
                });
            }),
        )?;
        log::debug!("list session mounted for {}", owner);

        Ok(Self {
            owner,
            store,
            view,
            errors,
            subscription: Some(subscription),
        })
    }

    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Copy of the current view
    pub fn view(&self) -> ListView {
        self.view.borrow().clone()
    }

    pub fn items(&self) -> Vec<TodoItem> {
        self.view.borrow().items.clone()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<ListView> {
        self.view.subscribe()
    }

    /// Wait until the view satisfies `ready`, returning that view
    pub async fn wait_for(&self, mut ready: impl FnMut(&ListView) -> bool) -> ListView {
        let mut rx = self.view.subscribe();
        let view = match rx.wait_for(|view| ready(view)).await {
            Ok(view) => view.clone(),
            // The sender lives in self, so the channel cannot close here
            Err(_) => self.view(),
        };
        view
    }

    /// Error of the most recent action
    pub fn error(&self) -> Option<ActionError> {
        self.errors.current()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        let text = text.into();
        self.view.send_modify(|view| view.draft = text);
    }

    /// Stop the live query. No snapshot is applied afterwards.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            log::debug!("list session for {} torn down", self.owner);
        }
    }

    fn report(&self, action: ActionError, err: &crate::domain::DomainError) {
        log::error!("{} ({}): {}", action, self.owner, err);
        self.errors.set(action);
    }
}

impl Drop for ListSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
