mod error;
mod launcher;
mod result;


pub use error::{HeadlessError, Result};
pub use launcher::{HeadlessLauncher, HeadlessOutcome, OUTPUT_SUFFIX};
pub use result::ResultImage;
