use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionAxis {
    X,
    Y,
    Z,
    Channel,
    Time,
    IlastikId,
}

impl PositionAxis {
    pub const ALL: [PositionAxis; 6] = [
        PositionAxis::X,
        PositionAxis::Y,
        PositionAxis::Z,
        PositionAxis::Channel,
        PositionAxis::Time,
        PositionAxis::IlastikId,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PositionAxis::X => "x",
            PositionAxis::Y => "y",
            PositionAxis::Z => "z",
            PositionAxis::Channel => "channel",
            PositionAxis::Time => "time",
            PositionAxis::IlastikId => "ilastik_id",
        }
    }
}
