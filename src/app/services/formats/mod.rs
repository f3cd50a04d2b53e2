//! Document file formats.
//!
//! Plain text and RTF are read and written. Word-processor packages (DOCX,
//! ODT) are recognised by extension but rejected with
//! `AppError::UnsupportedFormat`.

pub mod plain;
pub mod rtf;

use std::path::Path;

use crate::app::domain::document::{Document, LoadedContent};
use crate::app::domain::style::CharAttrs;
use crate::app::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    PlainText,
    Rtf,
    Docx,
    Odt,
}

impl FileFormat {
    /// Pick a format from the file extension; unknown extensions are text.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("rtf") => Self::Rtf,
            Some("docx") => Self::Docx,
            Some("odt") => Self::Odt,
            _ => Self::PlainText,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::PlainText => "Text Files",
            Self::Rtf => "Rich Text Files",
            Self::Docx => "Word Documents",
            Self::Odt => "OpenDocument Text",
        }
    }

    pub fn pattern(&self) -> &'static str {
        match self {
            Self::PlainText => "*.txt",
            Self::Rtf => "*.rtf",
            Self::Docx => "*.docx",
            Self::Odt => "*.odt",
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, Self::PlainText | Self::Rtf)
    }

    pub fn all() -> &'static [FileFormat] {
        &[Self::PlainText, Self::Rtf, Self::Docx, Self::Odt]
    }

    fn unsupported(&self) -> AppError {
        AppError::UnsupportedFormat(self.description().to_string())
    }
}

/// File-chooser filter listing the supported formats,
/// one `Description\tPattern` entry per line.
pub fn supported_files_filter() -> String {
    FileFormat::all()
        .iter()
        .filter(|f| f.is_supported())
        .map(|f| format!("{}\t{}", f.description(), f.pattern()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Load a file; `defaults` styles formats that carry no styling.
pub fn read_document(path: &Path, defaults: &CharAttrs) -> Result<LoadedContent> {
    let format = FileFormat::from_path(path);
    tracing::debug!("Reading {:?} as {:?}", path, format);
    match format {
        FileFormat::PlainText => plain::read(path),
        FileFormat::Rtf => rtf::read(path, defaults),
        FileFormat::Docx | FileFormat::Odt => Err(format.unsupported()),
    }
}

pub fn write_document(path: &Path, doc: &Document) -> Result<()> {
    let format = FileFormat::from_path(path);
    tracing::debug!("Writing {:?} as {:?}", path, format);
    match format {
        FileFormat::PlainText => plain::write(path, doc),
        FileFormat::Rtf => rtf::write(path, doc),
        FileFormat::Docx | FileFormat::Odt => Err(format.unsupported()),
    }
}
