use thiserror::Error;

use super::RowId;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("row `{0}` is not part of the position index")]
    NotFound(RowId),

    #[error("no position columns configured; at least one of x, y, z, channel, time or ilastik id is required")]
    NoColumnsConfigured,

    #[error("duplicate row key `{0}` in table")]
    DuplicateRow(RowId),

    #[error("row `{key}` has {actual} values but the table declares {expected} columns")]
    RowWidth {
        key: RowId,
        expected: usize,
        actual: usize,
    },
}
