use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ModelError, Result};

/// Key of one record in the host table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for RowId {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl Borrow<str> for RowId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub key: RowId,
    #[serde(default)]
    pub values: Vec<Option<f64>>,
}

impl TableRow {
    pub fn new(key: impl Into<RowId>, values: Vec<Option<f64>>) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }
}

/// Column-indexed snapshot of the host table. Cells are numeric or missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, key: impl Into<RowId>, values: Vec<Option<f64>>) -> Self {
        self.rows.push(TableRow::new(key, values));
        self
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.rows.len());
        for row in &self.rows {
            if row.values.len() != self.columns.len() {
                return Err(ModelError::RowWidth {
                    key: row.key.clone(),
                    expected: self.columns.len(),
                    actual: row.values.len(),
                });
            }
            if !seen.insert(&row.key) {
                return Err(ModelError::DuplicateRow(row.key.clone()));
            }
        }
        Ok(())
    }
}
