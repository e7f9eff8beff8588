use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

pub type Observer<E> = Arc<dyn Fn(&E) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Mutex-guarded listener registry shared between the GUI side and worker threads.
///
/// `notify` calls the observers in registration order on the calling thread. The
/// registry is snapshotted first, so an observer may register or unregister during
/// delivery; the change takes effect from the next notification. Observers are not
/// isolated from each other: a panicking observer unwinds through `notify` and the
/// remaining observers do not see that event.
pub struct ObserverList<E> {
    next_id: AtomicU64,
    observers: Mutex<Vec<(ListenerId, Observer<E>)>>,
}

impl<E> Default for ObserverList<E> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            observers: Mutex::new(Vec::new()),
        }
    }
}

impl<E> fmt::Debug for ObserverList<E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ObserverList")
            .field("registered", &self.len())
            .finish()
    }
}

impl<E> ObserverList<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, observer: Observer<E>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, observer));
        id
    }

    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut observers = self.lock();
        let before = observers.len();
        observers.retain(|(registered, _)| *registered != id);
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notify(&self, event: &E) {
        let snapshot = self
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect::<Vec<_>>();
        for observer in snapshot {
            observer(event);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, Observer<E>)>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
