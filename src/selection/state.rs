use std::collections::BTreeSet;

use crate::model::RowId;

use super::{HiliteEvent, Result, SelectionError};

/// Rows currently hilited, in hilite order, plus the row last centered in ilastik.
///
/// The focus is always one of the hilited rows or `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    hilited: Vec<RowId>,
    members: BTreeSet<RowId>,
    focus: Option<RowId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: impl IntoIterator<Item = RowId>) -> Self {
        let mut state = Self::new();
        for row in rows {
            state.add(row);
        }
        state
    }

    pub fn contains(&self, row: &RowId) -> bool {
        self.members.contains(row)
    }

    pub fn len(&self) -> usize {
        self.hilited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hilited.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RowId> {
        self.hilited.iter()
    }

    pub fn rows(&self) -> &BTreeSet<RowId> {
        &self.members
    }

    pub fn focus(&self) -> Option<&RowId> {
        self.focus.as_ref()
    }

    pub fn add(&mut self, row: RowId) -> bool {
        if !self.members.insert(row.clone()) {
            return false;
        }
        self.hilited.push(row);
        true
    }

    pub fn remove(&mut self, row: &RowId) -> bool {
        if !self.members.remove(row) {
            return false;
        }
        self.hilited.retain(|hilited| hilited != row);
        if self.focus.as_ref() == Some(row) {
            self.focus = None;
        }
        true
    }

    /// Flips membership of `row` and reports whether it is hilited afterwards.
    pub fn toggle(&mut self, row: RowId) -> bool {
        if self.contains(&row) {
            self.remove(&row);
            false
        } else {
            self.add(row);
            true
        }
    }

    pub fn clear(&mut self) -> Vec<RowId> {
        self.members.clear();
        self.focus = None;
        std::mem::take(&mut self.hilited)
    }

    pub fn set_focus(&mut self, row: &RowId) -> Result<()> {
        if !self.contains(row) {
            return Err(SelectionError::NotHilited(row.clone()));
        }
        self.focus = Some(row.clone());
        Ok(())
    }

    pub fn take_focus(&mut self) -> Option<RowId> {
        self.focus.take()
    }

    /// Applies `event` and reports whether the state changed.
    pub fn apply(&mut self, event: &HiliteEvent) -> bool {
        match event {
            HiliteEvent::Hilited(row) => self.add(row.clone()),
            HiliteEvent::Unhilited(row) => self.remove(row),
            HiliteEvent::Toggled(row) => {
                self.toggle(row.clone());
                true
            }
            HiliteEvent::ClearedAll => !self.clear().is_empty(),
        }
    }
}
