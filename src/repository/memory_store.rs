//! In-Memory Todo Store
//!
//! Reference implementation of [`TodoStore`] used by tests and local runs.
//! Documents live in insertion order, which is also the tie order of the
//! live query. Faults can be injected per operation, and every issued write
//! is recorded so callers can check exactly what was sent.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::traits::{SnapshotCallback, TodoQuery, TodoStore};
use crate::config::AppConfig;
use crate::domain::{DomainError, DomainResult, Entity, NewTodo, TodoId, TodoItem, TodoPatch, UserId};
use crate::subscription::{spawn_feed, Subscription};

/// A write as issued to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Insert(TodoId),
    Update(TodoId, TodoPatch),
    Delete(TodoId),
}

/// Issued write and whether it committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub op: WriteOp,
    pub committed: bool,
}

#[derive(Debug, Default)]
struct FaultPlan {
    inserts: bool,
    all_updates: bool,
    updates: HashSet<TodoId>,
    deletes: bool,
}

struct Listener {
    query: TodoQuery,
    tx: mpsc::UnboundedSender<Vec<TodoItem>>,
}

struct StoreInner {
    collection: String,
    docs: Vec<TodoItem>,
    listeners: HashMap<u64, Listener>,
    next_listener_id: u64,
    faults: FaultPlan,
    writes: Vec<WriteRecord>,
}

impl StoreInner {
    fn position(&self, id: &TodoId) -> Option<usize> {
        self.docs.iter().position(|doc| doc.id() == id)
    }

    /// Push a fresh snapshot to every listener watching `owner`
    fn notify(&mut self, owner: &UserId) {
        let docs = &self.docs;
        self.listeners.retain(|_, listener| {
            if &listener.query.owner_id != owner {
                return true;
            }
            listener.tx.send(listener.query.select(docs)).is_ok()
        });
    }

    fn record(&mut self, op: WriteOp, committed: bool) {
        self.writes.push(WriteRecord { op, committed });
    }
}

/// In-memory document store
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl MemoryStore {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                collection: collection.into(),
                docs: Vec::new(),
                listeners: HashMap::new(),
                next_listener_id: 0,
                faults: FaultPlan::default(),
                writes: Vec::new(),
            })),
        }
    }

    /// Store for the collection named in `config`
    pub fn for_config(config: &AppConfig) -> Self {
        Self::new(config.collection.clone())
    }

    fn lock(&self) -> DomainResult<MutexGuard<'_, StoreInner>> {
        self.inner.lock().map_err(|_| DomainError::poisoned("store"))
    }

    /// Name of the collection this store holds
    pub fn collection(&self) -> DomainResult<String> {
        Ok(self.lock()?.collection.clone())
    }

    /// Current result set for `owner`, as a live query would deliver it
    pub fn snapshot(&self, owner: &UserId) -> DomainResult<Vec<TodoItem>> {
        let inner = self.lock()?;
        Ok(TodoQuery::for_owner(owner.clone()).select(&inner.docs))
    }

    pub fn get(&self, id: &TodoId) -> DomainResult<Option<TodoItem>> {
        let inner = self.lock()?;
        Ok(inner.docs.iter().find(|doc| doc.id() == id).cloned())
    }

    /// Every write issued so far, in issue order
    pub fn writes(&self) -> DomainResult<Vec<WriteRecord>> {
        Ok(self.lock()?.writes.clone())
    }

    pub fn clear_writes(&self) -> DomainResult<()> {
        self.lock()?.writes.clear();
        Ok(())
    }

    /// Number of live queries still attached
    pub fn listener_count(&self) -> DomainResult<usize> {
        Ok(self.lock()?.listeners.len())
    }

    pub fn fail_inserts(&self, fail: bool) -> DomainResult<()> {
        self.lock()?.faults.inserts = fail;
        Ok(())
    }

    pub fn fail_updates(&self, fail: bool) -> DomainResult<()> {
        self.lock()?.faults.all_updates = fail;
        Ok(())
    }

    /// Reject updates to one document only
    pub fn fail_updates_for(&self, id: &TodoId) -> DomainResult<()> {
        self.lock()?.faults.updates.insert(id.clone());
        Ok(())
    }

    pub fn fail_deletes(&self, fail: bool) -> DomainResult<()> {
        self.lock()?.faults.deletes = fail;
        Ok(())
    }

    /// Drop every injected fault
    pub fn heal(&self) -> DomainResult<()> {
        self.lock()?.faults = FaultPlan::default();
        Ok(())
    }
}

fn detach(inner: &Weak<Mutex<StoreInner>>, listener_id: u64) {
    if let Some(inner) = inner.upgrade() {
        if let Ok(mut inner) = inner.lock() {
            inner.listeners.remove(&listener_id);
        }
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    fn subscribe(&self, query: TodoQuery, on_snapshot: SnapshotCallback) -> DomainResult<Subscription> {
        let mut inner = self.lock()?;
        let listener_id = inner.next_listener_id;
        inner.next_listener_id += 1;

        let weak = Arc::downgrade(&self.inner);
        let (tx, subscription) = spawn_feed(on_snapshot, move || detach(&weak, listener_id));

        // Initial result set
        let _ = tx.send(query.select(&inner.docs));
        log::debug!(
            "[{}] live query #{} attached for owner {}",
            inner.collection,
            listener_id,
            query.owner_id
        );
        inner.listeners.insert(listener_id, Listener { query, tx });

        Ok(subscription)
    }

    async fn insert(&self, todo: NewTodo) -> DomainResult<TodoId> {
        let mut inner = self.lock()?;
        let id = TodoId::new(Uuid::new_v4().simple().to_string());

        if inner.faults.inserts {
            inner.record(WriteOp::Insert(id), false);
            return Err(DomainError::Unavailable("insert rejected".to_string()));
        }

        let owner = todo.owner_id.clone();
        inner.docs.push(TodoItem::from_new(id.clone(), todo));
        inner.record(WriteOp::Insert(id.clone()), true);
        inner.notify(&owner);
        Ok(id)
    }

    async fn update(&self, id: &TodoId, patch: TodoPatch) -> DomainResult<()> {
        let mut inner = self.lock()?;
        let op = WriteOp::Update(id.clone(), patch);

        if inner.faults.all_updates || inner.faults.updates.contains(id) {
            inner.record(op, false);
            return Err(DomainError::Unavailable(format!("update of {} rejected", id)));
        }

        let Some(pos) = inner.position(id) else {
            inner.record(op, false);
            return Err(DomainError::NotFound(format!("Todo {} not found", id)));
        };

        inner.docs[pos].apply(&patch);
        let owner = inner.docs[pos].owner_id.clone();
        inner.record(op, true);
        inner.notify(&owner);
        Ok(())
    }

    async fn delete(&self, id: &TodoId) -> DomainResult<()> {
        let mut inner = self.lock()?;
        let op = WriteOp::Delete(id.clone());

        if inner.faults.deletes {
            inner.record(op, false);
            return Err(DomainError::Unavailable(format!("delete of {} rejected", id)));
        }

        let Some(pos) = inner.position(id) else {
            inner.record(op, false);
            return Err(DomainError::NotFound(format!("Todo {} not found", id)));
        };

        let removed = inner.docs.remove(pos);
        inner.record(op, true);
        inner.notify(&removed.owner_id);
        Ok(())
    }
}
