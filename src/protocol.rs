mod codec;
mod error;
mod message;


pub use codec::{decode, encode, read_message, write_message};
pub use error::{ProtocolError, Result};
pub use message::{ObjectRef, PEER_NAME, ViewerPosition, WireMessage};
