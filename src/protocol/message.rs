use serde::{Deserialize, Serialize};

use crate::model::PositionEntry;

/// Name this side announces in handshakes and position commands.
pub const PEER_NAME: &str = "knime";

pub(super) const COMMAND_HANDSHAKE: &str = "handshake";
pub(super) const COMMAND_SET_POSITION: &str = "setviewerposition";
pub(super) const COMMAND_UNSET_POSITION: &str = "unsetviewerposition";
pub(super) const MODE_HILITE: &str = "hilite";
pub(super) const MODE_UNHILITE: &str = "unhilite";
pub(super) const MODE_TOGGLE: &str = "toggle";
pub(super) const MODE_CLEAR: &str = "clear";
pub(super) const OPERAND_TIME: &str = "time";
pub(super) const OPERAND_ILASTIK_ID: &str = "ilastik_id";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewerPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub c: f64,
    pub t: f64,
    /// Whether other open selections in the viewer stay in place.
    pub keep_others: bool,
}

impl ViewerPosition {
    pub fn from_entry(entry: &PositionEntry, keep_others: bool) -> Self {
        Self {
            x: entry.x,
            y: entry.y,
            z: entry.z,
            c: entry.channel,
            t: entry.time,
            keep_others,
        }
    }
}

/// An ilastik object addressed by its id within one time frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub ilastik_id: i64,
    pub time: i64,
}

impl ObjectRef {
    pub fn new(ilastik_id: i64, time: i64) -> Self {
        Self { ilastik_id, time }
    }

    pub fn from_entry(entry: &PositionEntry) -> Self {
        Self::new(entry.ilastik_id.round() as i64, entry.time.round() as i64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WireMessage {
    Handshake { name: String, port: u16 },
    SetPosition(ViewerPosition),
    ClearPosition(ViewerPosition),
    Hilite(ObjectRef),
    Unhilite(ObjectRef),
    Toggle(ObjectRef),
    ClearAll,
}

impl WireMessage {
    pub fn handshake(port: u16) -> Self {
        WireMessage::Handshake {
            name: PEER_NAME.to_string(),
            port,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            WireMessage::Handshake { .. } => COMMAND_HANDSHAKE,
            WireMessage::SetPosition(_) => COMMAND_SET_POSITION,
            WireMessage::ClearPosition(_) => COMMAND_UNSET_POSITION,
            WireMessage::Hilite(_) => MODE_HILITE,
            WireMessage::Unhilite(_) => MODE_UNHILITE,
            WireMessage::Toggle(_) => MODE_TOGGLE,
            WireMessage::ClearAll => MODE_CLEAR,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct RawFrame {
    pub(super) command: Option<String>,
    pub(super) mode: Option<String>,
    pub(super) name: Option<String>,
    pub(super) port: Option<u16>,
    pub(super) x: Option<f64>,
    pub(super) y: Option<f64>,
    pub(super) z: Option<f64>,
    pub(super) c: Option<f64>,
    pub(super) t: Option<f64>,
    pub(super) keep: Option<bool>,
    #[serde(rename = "where")]
    pub(super) selector: Option<RawSelector>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawSelector {
    #[serde(default)]
    pub(super) operands: Vec<RawOperand>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawOperand {
    pub(super) row: String,
    pub(super) value: i64,
}
