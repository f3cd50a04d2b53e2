use std::path::Path;

use crate::app::domain::document::{Document, LoadedContent};
use crate::app::error::Result;
use crate::app::infrastructure::fs::{decode_utf8, read_bytes, write_atomic};

/// Read a text file verbatim; styling comes from the editor defaults.
pub fn read(path: &Path) -> Result<LoadedContent> {
    let text = decode_utf8(path, read_bytes(path)?);
    Ok(LoadedContent {
        text,
        ..Default::default()
    })
}

pub fn write(path: &Path, doc: &Document) -> Result<()> {
    write_atomic(path, doc.text().as_bytes())
}
