use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionStatus {
    Stopped,
    Listening { port: u16 },
    ClientDisconnected { port: u16 },
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Stopped => formatter.write_str("Server currently not running"),
            SessionStatus::Listening { port } => {
                write!(formatter, "Server is running on port {port}")
            }
            SessionStatus::ClientDisconnected { .. } => {
                formatter.write_str("Client is not connected. Please start Ilastik Server.")
            }
        }
    }
}
