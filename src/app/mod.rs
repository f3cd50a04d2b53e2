//! Application layer.
//!
//! # Structure
//!
//! - `domain/` - Core data structures (Document, styles, history, settings, messages)
//! - `services/` - Business operations (text_ops, find, file formats)
//! - `infrastructure/` - File system access
//! - `error.rs` - Error type shared by every layer
//! - `state.rs` - Editor coordinator; turns messages into document edits

pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod services;
pub mod state;

// Re-exports for convenient external access
pub use domain::{AppSettings, CharAttrs, Color, Document, DocumentId, FontSpec, Message, ParagraphAttrs};
pub use error::{AppError, Result};
pub use services::formats::FileFormat;
pub use services::text_ops::{LineColumn, SearchOptions};
pub use state::{EditorState, Outcome, StatusBar};
