//! Reload notification.

use std::sync::Arc;

use parking_lot::Mutex;

/// Listener notified whenever a resource has been reloaded.
///
/// Callbacks run after the resource's data lock has been released, so an
/// observer may read the resource it observes.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let reloads = Arc::new(AtomicUsize::new(0));
/// let counter = reloads.clone();
/// file.add_observer(Arc::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// }));
/// ```
pub trait ReloadObserver: Send + Sync {
    /// Called after the observed file was re-read.
    fn on_file_reload(&self);
}

impl<F: Fn() + Send + Sync> ReloadObserver for F {
    fn on_file_reload(&self) {
        self()
    }
}

/// Observer list guarded by its own lock.
#[derive(Default)]
pub(crate) struct ObserverSet {
    observers: Mutex<Vec<Arc<dyn ReloadObserver>>>,
}

impl ObserverSet {
    pub(crate) fn add(&self, observer: Arc<dyn ReloadObserver>) {
        self.observers.lock().push(observer);
    }

    /// Remove one registration of `observer` (by pointer identity).
    pub(crate) fn remove(&self, observer: &Arc<dyn ReloadObserver>) -> bool {
        let mut observers = self.observers.lock();
        match observers.iter().position(|o| same_observer(o, observer)) {
            Some(idx) => {
                observers.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Invoke every observer registered at the time of the call.
    ///
    /// The list lock is released before any callback runs.
    pub(crate) fn notify(&self) {
        let snapshot = self.observers.lock().clone();
        for observer in &snapshot {
            observer.on_file_reload();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.lock().len()
    }
}

// Compare data pointers only; vtable pointers for the same type may differ
// between codegen units.
fn same_observer(a: &Arc<dyn ReloadObserver>, b: &Arc<dyn ReloadObserver>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
