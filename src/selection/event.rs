use serde::{Deserialize, Serialize};

use crate::model::RowId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "row", rename_all = "snake_case")]
pub enum HiliteEvent {
    Hilited(RowId),
    Unhilited(RowId),
    Toggled(RowId),
    ClearedAll,
}

impl HiliteEvent {
    pub fn row(&self) -> Option<&RowId> {
        match self {
            HiliteEvent::Hilited(row) | HiliteEvent::Unhilited(row) | HiliteEvent::Toggled(row) => {
                Some(row)
            }
            HiliteEvent::ClearedAll => None,
        }
    }
}

/// Which side of the bridge caused a selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Host,
    Ilastik,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChange {
    pub event: HiliteEvent,
    pub origin: Origin,
}

impl SelectionChange {
    pub fn new(event: HiliteEvent, origin: Origin) -> Self {
        Self { event, origin }
    }
}
