use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Range {start}..{end} is outside the document (length {len})")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("Caret offset {caret} is past the end of the document (length {len})")]
    CaretOutOfRange { caret: usize, len: usize },

    #[error("Styled text does not fit its text: {0}")]
    InvalidStyledText(String),

    #[error("Line {0} does not exist")]
    InvalidLine(usize),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Nothing to search for")]
    EmptySearch,

    #[error("Document has no file path; use Save As")]
    NoFilePath,

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("RTF error: {0}")]
    Rtf(String),
}

/// Convenience type alias for Results with AppError
pub type Result<T> = std::result::Result<T, AppError>;
