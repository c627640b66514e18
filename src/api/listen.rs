//! Emulated "live" subscriptions: an immediate fetch followed by a
//! fixed-interval poll. Every callback delivers a full snapshot, never a
//! delta.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::api::database::DocStore;
use crate::api::query::{Query, QuerySnapshot};
use crate::api::reference::DocumentReference;
use crate::api::snapshot::DocumentSnapshot;
use crate::error::DocSqlError;
use crate::model::DocumentKey;

pub type NextFn<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;
pub type ErrorFn = Arc<dyn Fn(&DocSqlError) + Send + Sync + 'static>;

/// Callbacks a listener delivers into.
#[derive(Clone)]
pub struct SnapshotObserver<T> {
    next: Option<NextFn<T>>,
    error: Option<ErrorFn>,
}

impl<T> SnapshotObserver<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_next<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.next = Some(Arc::new(callback));
        self
    }

    pub fn with_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&DocSqlError) + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(callback));
        self
    }

    fn notify_next(&self, value: &T) {
        if let Some(next) = &self.next {
            next(value);
        }
    }

    fn notify_error(&self, error: &DocSqlError) {
        if let Some(handler) = &self.error {
            handler(error);
        }
    }
}

impl<T> Default for SnapshotObserver<T> {
    fn default() -> Self {
        Self {
            next: None,
            error: None,
        }
    }
}

/// Handle to an active polling listener.
///
/// `cancel()` stops future polls; a fetch already dispatched may still invoke
/// its callback once. The transition is terminal; re-subscribing requires a
/// new `on_*_snapshot` call. Dropping the handle without cancelling leaves
/// the poll running.
#[derive(Clone, Debug)]
pub struct ListenerRegistration {
    active: Arc<AtomicBool>,
}

impl ListenerRegistration {
    fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn cancel(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl DocStore {
    /// Subscribes to a single document: one immediate fetch, then a poll per
    /// interval. Requires a Tokio runtime.
    pub fn on_doc_snapshot(
        &self,
        reference: &DocumentReference,
        observer: SnapshotObserver<DocumentSnapshot>,
    ) -> ListenerRegistration {
        let registration = ListenerRegistration::new();
        let active = Arc::clone(&registration.active);
        let store = self.clone();
        let key: DocumentKey = reference.key().clone();
        let interval = self.poll_interval();

        tokio::spawn(async move {
            loop {
                if !active.load(Ordering::SeqCst) {
                    break;
                }
                match store.get_doc_by_key(&key).await {
                    Ok(snapshot) => observer.notify_next(&snapshot),
                    Err(err) => observer.notify_error(&err),
                }
                tokio::time::sleep(interval).await;
            }
        });

        registration
    }

    /// Subscribes to a query result set; same polling contract as
    /// [`on_doc_snapshot`](DocStore::on_doc_snapshot). Listeners are
    /// independent: N subscribers to the same query perform N fetches.
    pub fn on_query_snapshot(
        &self,
        query: &Query,
        observer: SnapshotObserver<QuerySnapshot>,
    ) -> ListenerRegistration {
        let registration = ListenerRegistration::new();
        let active = Arc::clone(&registration.active);
        let store = self.clone();
        let query = query.clone();
        let interval = self.poll_interval();

        tokio::spawn(async move {
            loop {
                if !active.load(Ordering::SeqCst) {
                    break;
                }
                match store.get_docs(&query).await {
                    Ok(snapshot) => observer.notify_next(&snapshot),
                    Err(err) => observer.notify_error(&err),
                }
                tokio::time::sleep(interval).await;
            }
        });

        registration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_cancels_once() {
        let registration = ListenerRegistration::new();
        assert!(registration.is_active());
        registration.cancel();
        assert!(!registration.is_active());
        registration.cancel();
        assert!(!registration.is_active());
    }

    #[test]
    fn observer_without_callbacks_is_silent() {
        let observer: SnapshotObserver<u32> = SnapshotObserver::new();
        observer.notify_next(&1);
        observer.notify_error(&crate::error::internal_error("ignored"));
    }
}
