mod error;
mod event;
mod handler;
mod observer;
mod state;


pub use error::{Result, SelectionError};
pub use event::{HiliteEvent, Origin, SelectionChange};
pub use handler::{HiliteHandler, HostSelection};
pub use observer::{ListenerId, Observer, ObserverList};
pub use state::SelectionState;
