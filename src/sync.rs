mod controller;
mod error;
mod relay;
mod status;


pub use controller::{SyncController, SyncOptions};
pub use error::{Result, SyncError};
pub use status::SessionStatus;
