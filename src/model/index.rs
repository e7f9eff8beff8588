use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::{ModelError, PositionAxis, PositionColumns, PositionEntry, Result, RowId, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    All,
    Any,
}

#[derive(Debug, Clone)]
struct IndexedRow {
    key: RowId,
    position: PositionEntry,
    object_id: Option<f64>,
    attributes: Vec<Option<f64>>,
}

/// Read-only row key → position lookup built once per session.
///
/// Entries keep the order of the scanned table; every lookup that can match more
/// than one row returns the first match in that order.
#[derive(Debug, Clone, Default)]
pub struct PositionIndex {
    columns: Vec<String>,
    rows: Vec<IndexedRow>,
    by_key: HashMap<RowId, usize>,
}

impl PositionIndex {
    pub fn build(table: &Table, columns: &PositionColumns) -> Result<Self> {
        table.validate()?;
        let axes = columns.resolve(table);
        let object_column = columns
            .object_id_column()
            .and_then(|name| table.column_index(name));

        let mut rows = Vec::with_capacity(table.rows.len());
        let mut by_key = HashMap::with_capacity(table.rows.len());
        for row in &table.rows {
            let mut position = PositionEntry::default();
            for (axis, column) in PositionAxis::ALL.iter().zip(axes) {
                if let Some(value) = column.and_then(|index| row.values[index]) {
                    position.set(*axis, value);
                }
            }
            by_key.insert(row.key.clone(), rows.len());
            rows.push(IndexedRow {
                key: row.key.clone(),
                position,
                object_id: object_column.and_then(|index| row.values[index]),
                attributes: row.values.clone(),
            });
        }

        tracing::debug!(rows = rows.len(), "position index built");
        Ok(Self {
            columns: table.columns.clone(),
            rows,
            by_key,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, key: &RowId) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn lookup_position(&self, key: &RowId) -> Result<PositionEntry> {
        self.by_key
            .get(key)
            .map(|index| self.rows[*index].position)
            .ok_or_else(|| ModelError::NotFound(key.clone()))
    }

    pub fn object_id(&self, key: &RowId) -> Option<f64> {
        self.by_key
            .get(key)
            .and_then(|index| self.rows[*index].object_id)
    }

    /// Linear scan for the row holding `(ilastik_id, time)`. Several rows may match;
    /// the first one in table order wins.
    pub fn lookup_by_ilastik_id_and_time(&self, ilastik_id: i64, time: i64) -> Option<&RowId> {
        self.rows
            .iter()
            .find(|row| row.position.matches_object(ilastik_id, time))
            .map(|row| &row.key)
    }

    /// Rows whose columns equal all (`MatchMode::All`) or any (`MatchMode::Any`) of the
    /// given values. Predicates naming an unknown column are skipped; a row never
    /// matches when no predicate names a known column.
    pub fn lookup_by_attributes(
        &self,
        predicates: &BTreeMap<String, i64>,
        mode: MatchMode,
    ) -> BTreeSet<RowId> {
        let resolved = predicates
            .iter()
            .filter_map(|(name, value)| {
                match self.columns.iter().position(|column| column == name) {
                    Some(index) => Some((index, *value)),
                    None => {
                        tracing::debug!(column = name.as_str(), "skipping unknown column");
                        None
                    }
                }
            })
            .collect::<Vec<_>>();
        if resolved.is_empty() {
            return BTreeSet::new();
        }

        self.rows
            .iter()
            .filter(|row| {
                let mut hits = resolved.iter().map(|(index, expected)| {
                    row.attributes[*index].is_some_and(|value| value == *expected as f64)
                });
                match mode {
                    MatchMode::All => hits.all(|hit| hit),
                    MatchMode::Any => hits.any(|hit| hit),
                }
            })
            .map(|row| row.key.clone())
            .collect()
    }
}
