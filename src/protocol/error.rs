use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed hilite message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("hilite message transport failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed before a message arrived")]
    ConnectionClosed,

    #[error("hilite message carries neither `command` nor `mode`")]
    MissingTag,

    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("unknown mode `{0}`")]
    UnknownMode(String),

    #[error("`{tag}` message is missing field `{field}`")]
    MissingField { tag: String, field: &'static str },
}
