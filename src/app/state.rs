use std::path::Path;

use super::domain::document::{Document, DocumentId};
use super::domain::history::StyledText;
use super::domain::messages::Message;
use super::domain::settings::AppSettings;
use super::domain::style::{CharAttrsPatch, Color, FontSpec, ParagraphAttrs};
use super::error::{AppError, Result};
use super::services::find::{FindResult, FindSession};
use super::services::formats::{read_document, write_document};
use super::services::text_ops::{LineColumn, SearchOptions, find_all, find_in_text, line_number_to_offset};

/// What a dispatched message led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Found { start: usize, end: usize },
    /// The search ran off the end; the next one starts over.
    Wrapped,
    NotFound,
    Replaced(usize),
    Quit,
}

impl From<FindResult> for Outcome {
    fn from(result: FindResult) -> Self {
        match result {
            FindResult::Found(range) => Outcome::Found {
                start: range.start,
                end: range.end,
            },
            FindResult::Wrapped => Outcome::Wrapped,
            FindResult::NotFound => Outcome::NotFound,
        }
    }
}

/// Status line contents: caret position and file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBar {
    pub position: LineColumn,
    pub file_name: String,
    pub dirty: bool,
}

impl StatusBar {
    pub fn line_label(&self) -> String {
        self.position.line_label()
    }

    pub fn column_label(&self) -> String {
        self.position.column_label()
    }

    pub fn window_title(&self) -> String {
        let prefix = if self.dirty { "*" } else { "" };
        format!("{}{} - RichPad", prefix, self.file_name)
    }
}

/// Spacing field text to points; anything unparsable counts as 0.
pub fn parse_spacing(field: &str) -> f32 {
    field.trim().parse::<i32>().map(|v| v as f32).unwrap_or(0.0)
}

/// The single-window editor: one document plus clipboard, find state and
/// settings. Every action goes through `dispatch`.
pub struct EditorState {
    document: Document,
    settings: AppSettings,
    clipboard: Option<StyledText>,
    find: FindSession,
    search_options: SearchOptions,
    next_id: u64,
}

impl EditorState {
    pub fn new(settings: AppSettings) -> Self {
        let document = Document::new_untitled(DocumentId(1), &settings.document_defaults());
        let search_options = settings.search_options();
        Self {
            document,
            settings,
            clipboard: None,
            find: FindSession::new(),
            search_options,
            next_id: 2,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn clipboard(&self) -> Option<&StyledText> {
        self.clipboard.as_ref()
    }

    pub fn search_options(&self) -> SearchOptions {
        self.search_options
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.document.is_dirty()
    }

    pub fn status(&self) -> StatusBar {
        StatusBar {
            position: self.document.line_column(),
            file_name: self.document.display_name.clone(),
            dirty: self.document.is_dirty(),
        }
    }

    pub fn dispatch(&mut self, message: Message) -> Result<Outcome> {
        tracing::debug!("dispatch {:?}", message);
        if !message.is_search() {
            self.find.reset();
        }
        match message {
            Message::FileNew => self.file_new(),
            Message::FileOpen(path) => self.file_open(&path),
            Message::FileSave => self.file_save(),
            Message::FileSaveAs(path) => self.file_save_as(&path),
            Message::FileExit => Ok(Outcome::Quit),

            Message::EditUndo => {
                self.document.undo();
                Ok(Outcome::Done)
            }
            Message::EditRedo => {
                self.document.redo();
                Ok(Outcome::Done)
            }
            Message::EditCut => self.cut(),
            Message::EditCopy => self.copy(),
            Message::EditPaste => self.paste(),
            Message::SelectAll => {
                self.document.select_all();
                Ok(Outcome::Done)
            }
            Message::InsertText(text) => self.insert_text(&text),
            Message::DeleteBackward => self.delete_backward(),
            Message::DeleteForward => self.delete_forward(),
            Message::MoveCaret(offset) => {
                self.document.set_caret(offset);
                Ok(Outcome::Done)
            }
            Message::Select { start, end } => {
                self.document.select(start, end);
                Ok(Outcome::Done)
            }
            Message::GoToLine(line) => self.go_to_line(line),

            Message::SetSearchOptions(options) => {
                self.search_options = options;
                self.settings.match_case = options.case_sensitive;
                self.settings.whole_word = options.whole_word;
                Ok(Outcome::Done)
            }
            Message::FindNext(query) => self.find_next(&query),
            Message::FindPrevious(query) => self.find_previous(&query),
            Message::ReplaceNext { find, replace } => self.replace_next(&find, &replace),
            Message::ReplaceAll { find, replace } => self.replace_all(&find, &replace),

            Message::SetFont(font) => self.set_font(&font),
            Message::SetTextColor(color) => self.set_text_color(color),
            Message::SetSpacing { top, bottom } => self.set_spacing(&top, &bottom),
        }
    }

    fn next_document_id(&mut self) -> DocumentId {
        let id = DocumentId(self.next_id);
        self.next_id += 1;
        id
    }

    fn remember_directory(&mut self, path: &Path) {
        if let Some(parent) = path.parent() {
            self.settings.last_open_directory = Some(parent.to_string_lossy().into_owned());
        }
    }

    // --- file ---

    pub fn file_new(&mut self) -> Result<Outcome> {
        let id = self.next_document_id();
        self.document = Document::new_untitled(id, &self.settings.document_defaults());
        self.find.reset();
        Ok(Outcome::Done)
    }

    pub fn file_open(&mut self, path: &Path) -> Result<Outcome> {
        let defaults = self.settings.document_defaults();
        let content = read_document(path, &defaults.char_attrs)?;
        let id = self.next_document_id();
        self.document = Document::from_loaded(id, path, content, &defaults);
        self.remember_directory(path);
        self.find.reset();
        tracing::info!("Opened {:?} ({} chars)", path, self.document.len_chars());
        Ok(Outcome::Done)
    }

    pub fn file_save(&mut self) -> Result<Outcome> {
        let path = self.document.file_path.clone().ok_or(AppError::NoFilePath)?;
        write_document(&path, &self.document)?;
        self.document.mark_clean();
        tracing::info!("Saved {:?}", path);
        Ok(Outcome::Done)
    }

    pub fn file_save_as(&mut self, path: &Path) -> Result<Outcome> {
        write_document(path, &self.document)?;
        self.document.file_path = Some(path.to_path_buf());
        self.document.update_display_name();
        self.document.mark_clean();
        self.remember_directory(path);
        tracing::info!("Saved {:?}", path);
        Ok(Outcome::Done)
    }

    // --- edit ---

    fn target_range(&self) -> (usize, usize) {
        self.document
            .selection()
            .unwrap_or((self.document.caret(), self.document.caret()))
    }

    fn copy(&mut self) -> Result<Outcome> {
        if let Some((start, end)) = self.document.selection() {
            self.clipboard = Some(self.document.styled_slice(start, end)?);
        }
        Ok(Outcome::Done)
    }

    fn cut(&mut self) -> Result<Outcome> {
        if let Some((start, end)) = self.document.selection() {
            self.clipboard = Some(self.document.styled_slice(start, end)?);
            self.document.delete(start, end)?;
        }
        Ok(Outcome::Done)
    }

    fn paste(&mut self) -> Result<Outcome> {
        let Some(styled) = self.clipboard.clone() else {
            return Ok(Outcome::Done);
        };
        let (start, end) = self.target_range();
        self.document.replace_styled(start, end, &styled)?;
        Ok(Outcome::Done)
    }

    fn insert_text(&mut self, text: &str) -> Result<Outcome> {
        let (start, end) = self.target_range();
        self.document.replace(start, end, text)?;
        Ok(Outcome::Done)
    }

    fn delete_backward(&mut self) -> Result<Outcome> {
        match self.document.selection() {
            Some((start, end)) => self.document.delete(start, end)?,
            None => {
                let caret = self.document.caret();
                if caret > 0 {
                    self.document.delete(caret - 1, caret)?;
                }
            }
        }
        Ok(Outcome::Done)
    }

    fn delete_forward(&mut self) -> Result<Outcome> {
        match self.document.selection() {
            Some((start, end)) => self.document.delete(start, end)?,
            None => {
                let caret = self.document.caret();
                if caret < self.document.len_chars() {
                    self.document.delete(caret, caret + 1)?;
                }
            }
        }
        Ok(Outcome::Done)
    }

    fn go_to_line(&mut self, line: usize) -> Result<Outcome> {
        let offset = line_number_to_offset(self.document.text(), line).ok_or(AppError::InvalidLine(line))?;
        self.document.set_caret(offset);
        Ok(Outcome::Done)
    }

    // --- find / replace ---

    fn find_next(&mut self, query: &str) -> Result<Outcome> {
        let (_, from) = self.target_range();
        let result = self
            .find
            .find_next(self.document.text(), query, from, self.search_options)?;
        if let FindResult::Found(ref range) = result {
            self.document.select(range.start, range.end);
        }
        Ok(result.into())
    }

    fn find_previous(&mut self, query: &str) -> Result<Outcome> {
        let (from, _) = self.target_range();
        let result = self
            .find
            .find_previous(self.document.text(), query, from, self.search_options)?;
        match result {
            FindResult::Found(ref range) => self.document.select(range.end, range.start),
            FindResult::Wrapped => {
                let end = self.document.len_chars();
                self.document.set_caret(end);
            }
            FindResult::NotFound => {}
        }
        Ok(result.into())
    }

    fn selection_matches(&self, query: &str) -> Option<(usize, usize)> {
        let (start, end) = self.document.selection()?;
        let selected = self.document.selected_text()?;
        let whole = 0..end - start;
        (find_in_text(&selected, query, 0, self.search_options) == Some(whole)).then_some((start, end))
    }

    /// Replace the selection if it is a match, then move to the next match.
    fn replace_next(&mut self, query: &str, replacement: &str) -> Result<Outcome> {
        if query.is_empty() {
            return Err(AppError::EmptySearch);
        }
        if let Some((start, end)) = self.selection_matches(query) {
            self.document.replace(start, end, replacement)?;
            self.find
                .resume_at(query, start + replacement.chars().count());
        }
        self.find_next(query)
    }

    fn replace_all(&mut self, query: &str, replacement: &str) -> Result<Outcome> {
        if query.is_empty() {
            return Err(AppError::EmptySearch);
        }
        let ranges: Vec<(usize, usize)> = find_all(self.document.text(), query, self.search_options)
            .into_iter()
            .map(|r| (r.start, r.end))
            .collect();
        if ranges.is_empty() {
            return Ok(Outcome::NotFound);
        }
        let count = self.document.replace_ranges(&ranges, replacement)?;
        self.document.set_caret(0);
        self.find.reset();
        tracing::debug!("Replaced {} occurrence(s) of {:?}", count, query);
        Ok(Outcome::Replaced(count))
    }

    // --- style ---

    /// Apply to the selection, or to the whole document when nothing is selected.
    fn apply_patch(&mut self, patch: &CharAttrsPatch) -> Result<Outcome> {
        match self.document.selection() {
            Some((start, end)) => self.document.apply_char_attrs(start, end, patch)?,
            None => self.document.apply_char_attrs_to_all(patch)?,
        }
        Ok(Outcome::Done)
    }

    fn set_font(&mut self, font: &FontSpec) -> Result<Outcome> {
        if font.family.trim().is_empty() {
            return Err(AppError::Settings("font family is empty".to_string()));
        }
        self.apply_patch(&CharAttrsPatch::font(font))
    }

    fn set_text_color(&mut self, color: Color) -> Result<Outcome> {
        self.apply_patch(&CharAttrsPatch::color(color))
    }

    fn set_spacing(&mut self, top: &str, bottom: &str) -> Result<Outcome> {
        let attrs = ParagraphAttrs::new(parse_spacing(top), parse_spacing(bottom));
        self.document.set_paragraph_attrs_to_all(attrs)?;
        Ok(Outcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with(text: &str) -> EditorState {
        let mut editor = EditorState::new(AppSettings::default());
        editor.dispatch(Message::InsertText(text.to_string())).unwrap();
        editor
    }

    #[test]
    fn test_starts_untitled() {
        let editor = EditorState::new(AppSettings::default());
        let status = editor.status();
        assert_eq!(status.file_name, "Untitled");
        assert_eq!(status.line_label(), "Line: 1");
        assert_eq!(status.column_label(), "Column: 0");
        assert_eq!(status.window_title(), "Untitled - RichPad");
    }

    #[test]
    fn test_status_follows_caret() {
        let mut editor = editor_with("one\ntwo\nthree");
        editor.dispatch(Message::MoveCaret(6)).unwrap();
        let status = editor.status();
        assert_eq!(status.line_label(), "Line: 2");
        assert_eq!(status.column_label(), "Column: 2");
        assert!(status.window_title().starts_with('*'));
    }

    #[test]
    fn test_parse_spacing() {
        assert_eq!(parse_spacing("12"), 12.0);
        assert_eq!(parse_spacing(" 4 "), 4.0);
        assert_eq!(parse_spacing("abc"), 0.0);
        assert_eq!(parse_spacing(""), 0.0);
        assert_eq!(parse_spacing("1.5"), 0.0);
    }

    #[test]
    fn test_spacing_applies_to_every_paragraph() {
        let mut editor = editor_with("a\nb");
        editor
            .dispatch(Message::SetSpacing {
                top: "6".to_string(),
                bottom: "oops".to_string(),
            })
            .unwrap();
        let paragraphs = editor.document().paragraphs();
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs.iter().all(|p| *p == ParagraphAttrs::new(6.0, 0.0)));
    }

    #[test]
    fn test_color_without_selection_styles_everything() {
        let mut editor = editor_with("abc");
        editor.dispatch(Message::SetTextColor(Color::rgb(0, 0, 255))).unwrap();
        let doc = editor.document();
        assert_eq!(doc.runs().runs().len(), 1);
        assert_eq!(doc.char_attrs_at(0).color, Color::rgb(0, 0, 255));
    }

    #[test]
    fn test_font_on_selection_only() {
        let mut editor = editor_with("hello world");
        editor.dispatch(Message::Select { start: 0, end: 5 }).unwrap();
        editor
            .dispatch(Message::SetFont(FontSpec::plain("Courier", 16)))
            .unwrap();
        let doc = editor.document();
        assert_eq!(doc.char_attrs_at(0).font_family, "Courier");
        assert_eq!(doc.char_attrs_at(0).font_size, 16);
        assert_eq!(doc.char_attrs_at(6).font_family, "Arial");
    }

    #[test]
    fn test_empty_font_family_rejected() {
        let mut editor = editor_with("x");
        assert!(editor.dispatch(Message::SetFont(FontSpec::plain("  ", 12))).is_err());
    }

    #[test]
    fn test_cut_paste_keeps_style() {
        let mut editor = editor_with("red plain");
        editor.dispatch(Message::Select { start: 0, end: 3 }).unwrap();
        editor.dispatch(Message::SetTextColor(Color::rgb(255, 0, 0))).unwrap();
        editor.dispatch(Message::EditCut).unwrap();
        assert_eq!(editor.document().text(), " plain");

        editor.dispatch(Message::MoveCaret(6)).unwrap();
        editor.dispatch(Message::EditPaste).unwrap();
        let doc = editor.document();
        assert_eq!(doc.text(), " plainred");
        assert_eq!(doc.char_attrs_at(6).color, Color::rgb(255, 0, 0));
        assert_eq!(doc.char_attrs_at(5).color, Color::BLACK);
    }

    #[test]
    fn test_copy_without_selection_keeps_clipboard() {
        let mut editor = editor_with("abc");
        editor.dispatch(Message::Select { start: 0, end: 1 }).unwrap();
        editor.dispatch(Message::EditCopy).unwrap();
        editor.dispatch(Message::MoveCaret(3)).unwrap();
        editor.dispatch(Message::EditCopy).unwrap();
        assert_eq!(editor.clipboard().map(|c| c.text.as_str()), Some("a"));
    }

    #[test]
    fn test_paste_with_empty_clipboard_is_noop() {
        let mut editor = editor_with("abc");
        editor.dispatch(Message::EditPaste).unwrap();
        assert_eq!(editor.document().text(), "abc");
    }

    #[test]
    fn test_typing_replaces_selection_and_undo() {
        let mut editor = editor_with("hello world");
        editor.dispatch(Message::Select { start: 6, end: 11 }).unwrap();
        editor.dispatch(Message::InsertText("there".to_string())).unwrap();
        assert_eq!(editor.document().text(), "hello there");
        editor.dispatch(Message::EditUndo).unwrap();
        assert_eq!(editor.document().text(), "hello world");
        editor.dispatch(Message::EditRedo).unwrap();
        assert_eq!(editor.document().text(), "hello there");
    }

    #[test]
    fn test_delete_backward_and_forward() {
        let mut editor = editor_with("abcd");
        editor.dispatch(Message::MoveCaret(2)).unwrap();
        editor.dispatch(Message::DeleteBackward).unwrap();
        assert_eq!(editor.document().text(), "acd");
        editor.dispatch(Message::DeleteForward).unwrap();
        assert_eq!(editor.document().text(), "ad");
        editor.dispatch(Message::MoveCaret(0)).unwrap();
        editor.dispatch(Message::DeleteBackward).unwrap();
        assert_eq!(editor.document().text(), "ad");
    }

    #[test]
    fn test_find_next_selects_and_wraps() {
        let mut editor = editor_with("cat dog cat");
        editor.dispatch(Message::MoveCaret(0)).unwrap();
        assert_eq!(
            editor.dispatch(Message::FindNext("cat".to_string())).unwrap(),
            Outcome::Found { start: 0, end: 3 }
        );
        assert_eq!(editor.document().selection(), Some((0, 3)));
        assert_eq!(
            editor.dispatch(Message::FindNext("cat".to_string())).unwrap(),
            Outcome::Found { start: 8, end: 11 }
        );
        assert_eq!(
            editor.dispatch(Message::FindNext("cat".to_string())).unwrap(),
            Outcome::Wrapped
        );
    }

    #[test]
    fn test_find_next_starts_at_moved_caret() {
        let mut editor = editor_with("cat cat cat");
        editor.dispatch(Message::MoveCaret(0)).unwrap();
        assert_eq!(
            editor.dispatch(Message::FindNext("cat".to_string())).unwrap(),
            Outcome::Found { start: 0, end: 3 }
        );
        editor.dispatch(Message::MoveCaret(8)).unwrap();
        assert_eq!(
            editor.dispatch(Message::FindNext("cat".to_string())).unwrap(),
            Outcome::Found { start: 8, end: 11 }
        );
    }

    #[test]
    fn test_find_next_after_edit_starts_at_caret() {
        let mut editor = editor_with("cat cat cat");
        editor.dispatch(Message::MoveCaret(0)).unwrap();
        editor.dispatch(Message::FindNext("cat".to_string())).unwrap();
        editor.dispatch(Message::FindNext("cat".to_string())).unwrap();
        assert_eq!(editor.document().selection(), Some((4, 7)));
        // Typing replaces the match; the next search continues from the
        // end of the typed text.
        editor.dispatch(Message::InsertText("dog".to_string())).unwrap();
        assert_eq!(editor.document().text(), "cat dog cat");
        assert_eq!(
            editor.dispatch(Message::FindNext("cat".to_string())).unwrap(),
            Outcome::Found { start: 8, end: 11 }
        );
    }

    #[test]
    fn test_find_next_from_backward_selection_end() {
        let mut editor = editor_with("cat cat cat");
        editor.dispatch(Message::Select { start: 7, end: 2 }).unwrap();
        assert_eq!(
            editor.dispatch(Message::FindNext("cat".to_string())).unwrap(),
            Outcome::Found { start: 8, end: 11 }
        );
    }

    #[test]
    fn test_find_previous_from_caret() {
        let mut editor = editor_with("cat dog cat");
        assert_eq!(
            editor.dispatch(Message::FindPrevious("cat".to_string())).unwrap(),
            Outcome::Found { start: 8, end: 11 }
        );
        assert_eq!(
            editor.dispatch(Message::FindPrevious("cat".to_string())).unwrap(),
            Outcome::Found { start: 0, end: 3 }
        );
        assert_eq!(
            editor.dispatch(Message::FindPrevious("cat".to_string())).unwrap(),
            Outcome::Wrapped
        );
        assert_eq!(editor.document().caret(), 11);
    }

    #[test]
    fn test_find_respects_search_options() {
        let mut editor = editor_with("Cat cat");
        editor.dispatch(Message::MoveCaret(0)).unwrap();
        editor
            .dispatch(Message::SetSearchOptions(SearchOptions::case_sensitive()))
            .unwrap();
        assert!(editor.settings().match_case);
        assert_eq!(
            editor.dispatch(Message::FindNext("cat".to_string())).unwrap(),
            Outcome::Found { start: 4, end: 7 }
        );
    }

    #[test]
    fn test_replace_next() {
        let mut editor = editor_with("cat dog cat");
        editor.dispatch(Message::MoveCaret(0)).unwrap();
        let replace = || Message::ReplaceNext {
            find: "cat".to_string(),
            replace: "bird".to_string(),
        };
        // First press only finds.
        assert_eq!(editor.dispatch(replace()).unwrap(), Outcome::Found { start: 0, end: 3 });
        assert_eq!(editor.document().text(), "cat dog cat");
        // Second press replaces the selected match and finds the next one.
        assert_eq!(editor.dispatch(replace()).unwrap(), Outcome::Found { start: 9, end: 12 });
        assert_eq!(editor.document().text(), "bird dog cat");
        editor.dispatch(replace()).unwrap();
        assert_eq!(editor.document().text(), "bird dog bird");
    }

    #[test]
    fn test_replace_all_is_one_undo_step() {
        let mut editor = editor_with("Cat cat CAT");
        let outcome = editor
            .dispatch(Message::ReplaceAll {
                find: "cat".to_string(),
                replace: "dog".to_string(),
            })
            .unwrap();
        assert_eq!(outcome, Outcome::Replaced(3));
        assert_eq!(editor.document().text(), "dog dog dog");
        assert_eq!(editor.document().caret(), 0);
        editor.dispatch(Message::EditUndo).unwrap();
        assert_eq!(editor.document().text(), "Cat cat CAT");
    }

    #[test]
    fn test_replace_all_no_match() {
        let mut editor = editor_with("hello");
        let outcome = editor
            .dispatch(Message::ReplaceAll {
                find: "bye".to_string(),
                replace: "x".to_string(),
            })
            .unwrap();
        assert_eq!(outcome, Outcome::NotFound);
    }

    #[test]
    fn test_empty_search_is_error() {
        let mut editor = editor_with("hello");
        assert!(matches!(
            editor.dispatch(Message::FindNext(String::new())),
            Err(AppError::EmptySearch)
        ));
        assert!(editor
            .dispatch(Message::ReplaceAll {
                find: String::new(),
                replace: "x".to_string()
            })
            .is_err());
    }

    #[test]
    fn test_go_to_line() {
        let mut editor = editor_with("a\nb\nc");
        editor.dispatch(Message::GoToLine(3)).unwrap();
        assert_eq!(editor.document().caret(), 4);
        assert!(matches!(
            editor.dispatch(Message::GoToLine(9)),
            Err(AppError::InvalidLine(9))
        ));
    }

    #[test]
    fn test_save_without_path() {
        let mut editor = editor_with("x");
        assert!(matches!(
            editor.dispatch(Message::FileSave),
            Err(AppError::NoFilePath)
        ));
    }

    #[test]
    fn test_new_resets_document() {
        let mut editor = editor_with("some text");
        let old_id = editor.document().id;
        editor.dispatch(Message::FileNew).unwrap();
        assert!(editor.document().is_empty());
        assert_ne!(editor.document().id, old_id);
        assert_eq!(editor.status().file_name, "Untitled");
        assert!(!editor.has_unsaved_changes());
    }

    #[test]
    fn test_exit_quits() {
        let mut editor = EditorState::new(AppSettings::default());
        assert_eq!(editor.dispatch(Message::FileExit).unwrap(), Outcome::Quit);
    }
}
