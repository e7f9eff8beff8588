use serde::{Deserialize, Serialize};

use super::{ModelError, PositionAxis, Result, Table};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionEntry {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub channel: f64,
    pub time: f64,
    pub ilastik_id: f64,
}

impl PositionEntry {
    pub fn get(&self, axis: PositionAxis) -> f64 {
        match axis {
            PositionAxis::X => self.x,
            PositionAxis::Y => self.y,
            PositionAxis::Z => self.z,
            PositionAxis::Channel => self.channel,
            PositionAxis::Time => self.time,
            PositionAxis::IlastikId => self.ilastik_id,
        }
    }

    pub fn set(&mut self, axis: PositionAxis, value: f64) {
        match axis {
            PositionAxis::X => self.x = value,
            PositionAxis::Y => self.y = value,
            PositionAxis::Z => self.z = value,
            PositionAxis::Channel => self.channel = value,
            PositionAxis::Time => self.time = value,
            PositionAxis::IlastikId => self.ilastik_id = value,
        }
    }

    pub fn matches_object(&self, ilastik_id: i64, time: i64) -> bool {
        self.ilastik_id == ilastik_id as f64 && self.time == time as f64
    }
}

/// Names of the table columns holding each coordinate. Empty names count as unset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionColumns {
    pub x: Option<String>,
    pub y: Option<String>,
    pub z: Option<String>,
    pub channel: Option<String>,
    pub time: Option<String>,
    pub ilastik_id: Option<String>,
    pub object_id: Option<String>,
}

impl PositionColumns {
    pub fn column(&self, axis: PositionAxis) -> Option<&str> {
        let name = match axis {
            PositionAxis::X => &self.x,
            PositionAxis::Y => &self.y,
            PositionAxis::Z => &self.z,
            PositionAxis::Channel => &self.channel,
            PositionAxis::Time => &self.time,
            PositionAxis::IlastikId => &self.ilastik_id,
        };
        non_empty(name)
    }

    pub fn object_id_column(&self) -> Option<&str> {
        non_empty(&self.object_id)
    }

    pub fn is_configured(&self) -> bool {
        PositionAxis::ALL
            .iter()
            .any(|axis| self.column(*axis).is_some())
    }

    pub fn ensure_configured(&self) -> Result<()> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(ModelError::NoColumnsConfigured)
        }
    }

    /// Resolves each configured axis to a column index of `table`. Axes whose column is
    /// unset or absent from the table resolve to `None` and read as 0.0.
    pub(crate) fn resolve(&self, table: &Table) -> [Option<usize>; 6] {
        PositionAxis::ALL.map(|axis| {
            let name = self.column(axis)?;
            let index = table.column_index(name);
            if index.is_none() {
                tracing::warn!(
                    axis = axis.label(),
                    column = name,
                    "configured position column not found, using 0.0"
                );
            }
            index
        })
    }
}

fn non_empty(name: &Option<String>) -> Option<&str> {
    name.as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
}
