use thiserror::Error;

use crate::hilite::ServerError;
use crate::model::ModelError;
use crate::selection::SelectionError;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("hilite session configuration error: {0}")]
    Configuration(#[source] ModelError),

    #[error("position lookup failed: {0}")]
    Model(#[source] ModelError),

    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("hilite server error: {0}")]
    Server(#[from] ServerError),
}

impl From<ModelError> for SyncError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::NoColumnsConfigured => SyncError::Configuration(error),
            other => SyncError::Model(other),
        }
    }
}
