use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HeadlessError>;

#[derive(Debug, Error)]
pub enum HeadlessError {
    #[error("no ilastik executable configured")]
    MissingExecutable,

    #[error("no ilastik project configured")]
    MissingProject,

    #[error("input `{0}` does not exist")]
    MissingInput(PathBuf),

    #[error("headless I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("ilastik exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("result image `{path}` is unreadable: {source}")]
    ResultImage {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    #[error("result image `{0}` has pages of different sizes")]
    InconsistentPages(PathBuf),
}
