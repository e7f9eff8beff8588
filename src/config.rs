mod error;
mod io;
mod settings;


pub use error::{ConfigError, Result};
pub use io::{load_config, load_table, save_config};
pub use settings::{BridgeConfig, HeadlessSettings, HiliteSettings};
