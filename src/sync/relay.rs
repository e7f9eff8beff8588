use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::hilite::HiliteClient;
use crate::logging::BridgeLog;
use crate::model::{PositionIndex, RowId};
use crate::selection::{HiliteEvent, HostSelection, Origin, SelectionChange, SelectionState};

use super::SyncOptions;

pub(super) fn lock(selection: &Mutex<SelectionState>) -> MutexGuard<'_, SelectionState> {
    selection.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Host table → ilastik. Mirrors every host change into the session selection and
/// forwards changes made on the host side to the client.
pub(super) struct HostRelay {
    pub(super) index: Arc<PositionIndex>,
    pub(super) selection: Arc<Mutex<SelectionState>>,
    pub(super) client: Arc<dyn HiliteClient>,
    pub(super) options: SyncOptions,
    pub(super) log: Arc<dyn BridgeLog>,
}

impl HostRelay {
    pub(super) fn on_host_change(&self, change: &SelectionChange) {
        let (lost_focus, hilited_now) = {
            let mut selection = lock(&self.selection);
            let focus_before = selection.focus().cloned();
            selection.apply(&change.event);
            let lost_focus = focus_before.filter(|row| selection.focus() != Some(row));
            let hilited_now = change
                .event
                .row()
                .is_some_and(|row| selection.contains(row));
            (lost_focus, hilited_now)
        };

        // Changes fired on behalf of ilastik must not travel back to it.
        if change.origin == Origin::Ilastik {
            return;
        }

        if let Some(row) = lost_focus {
            self.clear_position(&row);
        }
        if !self.options.forward_hilites {
            return;
        }
        match &change.event {
            HiliteEvent::Hilited(row) => self.send_hilite(row, true),
            HiliteEvent::Unhilited(row) => self.send_hilite(row, false),
            HiliteEvent::Toggled(row) => self.send_hilite(row, hilited_now),
            HiliteEvent::ClearedAll => self.client.send_hilite_toggle(0.0, 0.0, false, true),
        }
    }

    fn send_hilite(&self, row: &RowId, hilite: bool) {
        match self.index.lookup_position(row) {
            Ok(entry) => {
                self.client
                    .send_hilite_toggle(entry.ilastik_id, entry.time, hilite, false)
            }
            Err(error) => self.log.debug(&format!("{error}, hilite not forwarded")),
        }
    }

    fn clear_position(&self, row: &RowId) {
        match self.index.lookup_position(row) {
            Ok(entry) => {
                self.client
                    .send_position_changed(&entry, self.options.keep_others, true)
            }
            Err(error) => self.log.debug(&format!("{error}, position not cleared")),
        }
    }
}

/// Ilastik → host table. Every event is fired with `Origin::Ilastik`.
pub(super) fn apply_inbound<H: HostSelection>(host: &H, event: &HiliteEvent) {
    match event {
        HiliteEvent::Hilited(row) => host.fire_select(row, Origin::Ilastik),
        HiliteEvent::Unhilited(row) => host.fire_deselect(row, Origin::Ilastik),
        HiliteEvent::Toggled(row) => {
            // Check-then-act: a concurrent host change between the two calls wins.
            if host.current_selection().contains(row) {
                host.fire_deselect(row, Origin::Ilastik);
            } else {
                host.fire_select(row, Origin::Ilastik);
            }
        }
        HiliteEvent::ClearedAll => host.fire_clear_all(Origin::Ilastik),
    }
}
