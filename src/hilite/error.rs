use thiserror::Error;

use crate::protocol::ProtocolError;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cannot listen on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot start hilite server thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("hilite server I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Outbound failures. These never leave a send call; they are logged and reflected by
/// `HiliteClient::is_connected`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("cannot connect to ilastik at {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write to ilastik: {0}")]
    Write(#[from] ProtocolError),
}
