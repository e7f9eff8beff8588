use crate::config::ConfigError;
use crate::headless::HeadlessError;
use crate::hilite::ServerError;
use crate::model::ModelError;
use crate::sync::SyncError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("position index error: {0}")]
    Model(#[from] ModelError),

    #[error("hilite server error: {0}")]
    Server(#[from] ServerError),

    #[error("hilite session error: {0}")]
    Sync(#[from] SyncError),

    #[error("headless run error: {0}")]
    Headless(#[from] HeadlessError),
}
