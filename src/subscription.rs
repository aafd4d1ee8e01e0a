//! Cancellable Subscriptions
//!
//! Live feeds (identity changes, query snapshots) hand their values to a
//! callback on a spawned task. The returned [`Subscription`] stops delivery
//! when it is unsubscribed or dropped.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

/// Callback invoked for every value delivered by a feed
pub type Callback<T> = Box<dyn Fn(T) + Send + Sync>;

/// Handle to a standing subscription
///
/// Dropping the handle cancels the subscription.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop delivery now
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Spawn a delivery task feeding `callback` from the returned sender.
///
/// The callback runs under the `active` lock, so cancelling waits for a
/// callback already in flight and nothing is delivered once it returns.
/// `on_cancel` runs once after delivery has been switched off.
///
/// Must be called inside a tokio runtime. Cancelling from inside the
/// callback itself deadlocks.
pub(crate) fn spawn_feed<T>(
    callback: Callback<T>,
    on_cancel: impl FnOnce() + Send + Sync + 'static,
) -> (mpsc::UnboundedSender<T>, Subscription)
where
    T: Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<T>();
    let active = Arc::new(Mutex::new(true));

    let task_active = Arc::clone(&active);
    let handle = tokio::spawn(async move {
        while let Some(value) = rx.recv().await {
            let Ok(active) = task_active.lock() else {
                break;
            };
            if !*active {
                break;
            }
            callback(value);
        }
    });

    let subscription = Subscription::new(move || {
        match active.lock() {
            Ok(mut active) => *active = false,
            Err(poisoned) => *poisoned.into_inner() = false,
        }
        handle.abort();
        on_cancel();
    });

    (tx, subscription)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_feed_delivers_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let (tx, _sub) = spawn_feed::<u32>(Box::new(move |v| sink.lock().unwrap().push(v)), || {});

        tx.send(1).unwrap();
        tx.send(2).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_no_delivery_after_unsubscribe() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let cancelled = Arc::new(AtomicBool::new(false));
        let sink = Arc::clone(&seen);
        let flag = Arc::clone(&cancelled);
        let (tx, sub) = spawn_feed::<u32>(Box::new(move |v| sink.lock().unwrap().push(v)), move || {
            flag.store(true, Ordering::SeqCst)
        });

        sub.unsubscribe();
        let _ = tx.send(5);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(seen.lock().unwrap().is_empty());
        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_drop_cancels() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let (_tx, sub) = spawn_feed::<u32>(Box::new(|_| {}), move || flag.store(true, Ordering::SeqCst));
        drop(sub);
        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_unsubscribe_waits_for_running_callback() {
        for _ in 0..20 {
            let started = Arc::new(AtomicBool::new(false));
            let finished = Arc::new(AtomicUsize::new(0));
            let (on_start, on_finish) = (Arc::clone(&started), Arc::clone(&finished));
            let (tx, sub) = spawn_feed::<u32>(
                Box::new(move |_| {
                    on_start.store(true, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(10));
                    on_finish.fetch_add(1, Ordering::SeqCst);
                }),
                || {},
            );

            tx.send(1).unwrap();
            tokio::time::timeout(Duration::from_secs(2), async {
                while !started.load(Ordering::SeqCst) {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            })
            .await
            .expect("callback never started");

            sub.unsubscribe();
            assert_eq!(finished.load(Ordering::SeqCst), 1);

            let _ = tx.send(2);
            tokio::time::sleep(Duration::from_millis(20)).await;
            assert_eq!(finished.load(Ordering::SeqCst), 1);
        }
    }
}
