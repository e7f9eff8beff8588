use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tiff::decoder::Decoder;

use super::{HeadlessError, Result};

/// Result image written by ilastik for one row, named `<row>_result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultImage {
    pub path: PathBuf,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pages: usize,
}

impl ResultImage {
    /// Reads the page layout of a result TIFF. Every page must share the first
    /// page's dimensions.
    pub fn inspect(path: &Path) -> Result<Self> {
        let invalid = |source: tiff::TiffError| HeadlessError::ResultImage {
            path: path.to_path_buf(),
            source,
        };
        let file = BufReader::new(File::open(path)?);
        let mut decoder = Decoder::new(file).map_err(invalid)?;
        let (width, height) = decoder.dimensions().map_err(invalid)?;
        let mut pages = 1;
        while decoder.more_images() {
            decoder.next_image().map_err(invalid)?;
            if decoder.dimensions().map_err(invalid)? != (width, height) {
                return Err(HeadlessError::InconsistentPages(path.to_path_buf()));
            }
            pages += 1;
        }

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            path: path.to_path_buf(),
            name,
            width,
            height,
            pages,
        })
    }
}
