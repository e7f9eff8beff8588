use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::model::RowId;

use super::{HiliteEvent, ListenerId, Observer, ObserverList, Origin, SelectionChange, SelectionState};

/// Native selection API of the host table the bridge is attached to.
pub trait HostSelection: Send + Sync + 'static {
    fn current_selection(&self) -> BTreeSet<RowId>;
    fn fire_select(&self, row: &RowId, origin: Origin);
    fn fire_deselect(&self, row: &RowId, origin: Origin);
    fn fire_clear_all(&self, origin: Origin);
    fn subscribe(&self, observer: Observer<SelectionChange>) -> ListenerId;
    fn unsubscribe(&self, id: ListenerId) -> bool;
}

/// In-process host selection: a hilite set that notifies subscribers on every change.
#[derive(Debug, Default)]
pub struct HiliteHandler {
    state: Mutex<SelectionState>,
    observers: ObserverList<SelectionChange>,
}

impl HiliteHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    fn state(&self) -> MutexGuard<'_, SelectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, event: HiliteEvent, origin: Origin) {
        // Lock is released before observers run so they can query the selection.
        let changed = self.state().apply(&event);
        if changed {
            self.observers.notify(&SelectionChange::new(event, origin));
        }
    }
}

impl HostSelection for HiliteHandler {
    fn current_selection(&self) -> BTreeSet<RowId> {
        self.state().rows().clone()
    }

    fn fire_select(&self, row: &RowId, origin: Origin) {
        self.apply(HiliteEvent::Hilited(row.clone()), origin);
    }

    fn fire_deselect(&self, row: &RowId, origin: Origin) {
        self.apply(HiliteEvent::Unhilited(row.clone()), origin);
    }

    fn fire_clear_all(&self, origin: Origin) {
        self.apply(HiliteEvent::ClearedAll, origin);
    }

    fn subscribe(&self, observer: Observer<SelectionChange>) -> ListenerId {
        self.observers.register(observer)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.observers.unregister(id)
    }
}
