//! Domain layer - core data structures and types.
//!
//! This module contains the fundamental domain models:
//! - Document and DocumentId
//! - Character and paragraph styling, style runs
//! - Undo/redo history
//! - Application settings
//! - Message types for the event system

pub mod document;
pub mod history;
pub mod messages;
pub mod runs;
pub mod settings;
pub mod style;

pub use document::{Document, DocumentId};
pub use history::StyledText;
pub use messages::Message;
pub use runs::{Run, StyleRuns};
pub use settings::AppSettings;
pub use style::{CharAttrs, CharAttrsPatch, Color, FontSpec, ParagraphAttrs};
