use thiserror::Error;

use crate::model::RowId;

pub type Result<T> = std::result::Result<T, SelectionError>;

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("row `{0}` is not hilited and cannot take the focus")]
    NotHilited(RowId),
}
