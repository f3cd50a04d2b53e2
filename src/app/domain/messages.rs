use std::path::PathBuf;

use super::style::{Color, FontSpec};
use crate::app::services::text_ops::SearchOptions;

/// Every user action the editor understands.
/// A front end maps each menu item or dialog result to one of these and
/// hands it to `EditorState::dispatch`.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // File
    FileNew,
    FileOpen(PathBuf),
    FileSave,
    FileSaveAs(PathBuf),
    FileExit,

    // Edit
    EditUndo,
    EditRedo,
    EditCut,
    EditCopy,
    EditPaste,
    SelectAll,
    InsertText(String),
    DeleteBackward,
    DeleteForward,
    MoveCaret(usize),
    Select { start: usize, end: usize },
    GoToLine(usize),

    // Find / replace
    SetSearchOptions(SearchOptions),
    FindNext(String),
    FindPrevious(String),
    ReplaceNext { find: String, replace: String },
    ReplaceAll { find: String, replace: String },

    // Style
    SetFont(FontSpec),
    SetTextColor(Color),

    /// Paragraph spacing as typed into the Top/Bottom fields.
    SetSpacing { top: String, bottom: String },
}

impl Message {
    /// Find and replace actions; every other message invalidates the
    /// remembered search position.
    pub fn is_search(&self) -> bool {
        matches!(
            self,
            Message::FindNext(_)
                | Message::FindPrevious(_)
                | Message::ReplaceNext { .. }
                | Message::ReplaceAll { .. }
        )
    }
}
