//! Stub Auth Provider
//!
//! In-memory identity service. Sign-in resolves to a scripted result; the
//! session can also be changed from outside (another tab signing out, a
//! refreshed token) with [`StubAuthProvider::emit`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::traits::{AuthProvider, IdentityCallback};
use crate::domain::{DomainError, DomainResult, Identity};
use crate::subscription::{spawn_feed, Subscription};

struct AuthInner {
    current: Option<Identity>,
    sign_in_result: DomainResult<Identity>,
    sign_out_error: Option<DomainError>,
    watchers: HashMap<u64, mpsc::UnboundedSender<Option<Identity>>>,
    next_watcher_id: u64,
}

impl AuthInner {
    fn set_current(&mut self, identity: Option<Identity>) {
        self.current = identity;
        let current = &self.current;
        self.watchers.retain(|_, tx| tx.send(current.clone()).is_ok());
    }
}

#[derive(Clone)]
pub struct StubAuthProvider {
    inner: Arc<Mutex<AuthInner>>,
}

impl Default for StubAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StubAuthProvider {
    /// Signed out; sign-in fails until a result is scripted
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(AuthInner {
                current: None,
                sign_in_result: Err(DomainError::Unavailable("no account configured".to_string())),
                sign_out_error: None,
                watchers: HashMap::new(),
                next_watcher_id: 0,
            })),
        }
    }

    /// Already signed in as `identity`; signing in again yields the same user
    pub fn signed_in(identity: Identity) -> Self {
        let provider = Self::new();
        if let Ok(mut inner) = provider.inner.lock() {
            inner.current = Some(identity.clone());
            inner.sign_in_result = Ok(identity);
        }
        provider
    }

    fn lock(&self) -> DomainResult<MutexGuard<'_, AuthInner>> {
        self.inner.lock().map_err(|_| DomainError::poisoned("auth"))
    }

    /// Script the outcome of the next interactive sign-in
    pub fn set_sign_in_result(&self, result: DomainResult<Identity>) -> DomainResult<()> {
        self.lock()?.sign_in_result = result;
        Ok(())
    }

    pub fn fail_sign_out(&self, error: Option<DomainError>) -> DomainResult<()> {
        self.lock()?.sign_out_error = error;
        Ok(())
    }

    /// Change the session from outside the app
    pub fn emit(&self, identity: Option<Identity>) -> DomainResult<()> {
        self.lock()?.set_current(identity);
        Ok(())
    }

    pub fn current(&self) -> DomainResult<Option<Identity>> {
        Ok(self.lock()?.current.clone())
    }

    pub fn watcher_count(&self) -> DomainResult<usize> {
        Ok(self.lock()?.watchers.len())
    }
}

fn detach(inner: &Weak<Mutex<AuthInner>>, watcher_id: u64) {
    if let Some(inner) = inner.upgrade() {
        if let Ok(mut inner) = inner.lock() {
            inner.watchers.remove(&watcher_id);
        }
    }
}

#[async_trait]
impl AuthProvider for StubAuthProvider {
    fn watch(&self, on_change: IdentityCallback) -> DomainResult<Subscription> {
        let mut inner = self.lock()?;
        let watcher_id = inner.next_watcher_id;
        inner.next_watcher_id += 1;

        let weak = Arc::downgrade(&self.inner);
        let (tx, subscription) = spawn_feed(on_change, move || detach(&weak, watcher_id));
        let _ = tx.send(inner.current.clone());
        inner.watchers.insert(watcher_id, tx);

        Ok(subscription)
    }

    async fn sign_in(&self) -> DomainResult<Identity> {
        let mut inner = self.lock()?;
        let identity = inner.sign_in_result.clone()?;
        inner.set_current(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> DomainResult<()> {
        let mut inner = self.lock()?;
        if let Some(err) = inner.sign_out_error.clone() {
            return Err(err);
        }
        inner.set_current(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn recorder() -> (Arc<Mutex<Vec<Option<Identity>>>>, IdentityCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, Box::new(move |identity| sink.lock().unwrap().push(identity)))
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_watch_reports_initial_state_then_changes() {
        let provider = StubAuthProvider::new();
        provider
            .set_sign_in_result(Ok(Identity::new("u1", Some("Ada".to_string()))))
            .unwrap();

        let (seen, callback) = recorder();
        let _sub = provider.watch(callback).unwrap();
        settle().await;

        provider.sign_in().await.unwrap();
        provider.sign_out().await.unwrap();
        settle().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].is_none());
        assert_eq!(seen[1].as_ref().map(|i| i.uid.as_str()), Some("u1"));
        assert!(seen[2].is_none());
    }

    #[tokio::test]
    async fn test_failed_sign_in_leaves_session() {
        let provider = StubAuthProvider::new();
        assert!(provider.sign_in().await.is_err());
        assert!(provider.current().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_sign_out_keeps_identity() {
        let provider = StubAuthProvider::signed_in(Identity::new("u1", None));
        provider
            .fail_sign_out(Some(DomainError::Unavailable("offline".to_string())))
            .unwrap();

        assert!(provider.sign_out().await.is_err());
        assert!(provider.current().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unsubscribe_detaches_watcher() {
        let provider = StubAuthProvider::new();
        let (_seen, callback) = recorder();
        let sub = provider.watch(callback).unwrap();
        assert_eq!(provider.watcher_count().unwrap(), 1);
        drop(sub);
        assert_eq!(provider.watcher_count().unwrap(), 0);
    }
}
