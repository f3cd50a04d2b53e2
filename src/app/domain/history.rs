use std::collections::VecDeque;

use super::runs::{Run, StyleRuns};
use super::style::ParagraphAttrs;
use crate::app::error::{AppError, Result};

/// Text together with its attribute runs, as moved by edits and the clipboard.
///
/// `paragraphs` holds the attributes of each paragraph started by a newline
/// inside `text`. When it is empty the new paragraphs copy the attributes
/// of the paragraph they are inserted into. Empty `runs` means the text
/// takes the attributes of its insertion point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyledText {
    pub text: String,
    pub runs: Vec<Run>,
    pub paragraphs: Vec<ParagraphAttrs>,
}

impl StyledText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Runs must cover the text exactly and paragraphs must match its
    /// newlines; either may be empty to inherit from the insertion point.
    pub fn validate(&self) -> Result<()> {
        let chars = self.char_len();
        let covered: usize = self.runs.iter().map(|r| r.len).sum();
        if !self.runs.is_empty() && covered != chars {
            return Err(AppError::InvalidStyledText(format!(
                "runs cover {} chars, text has {}",
                covered, chars
            )));
        }
        let newlines = self.text.matches('\n').count();
        if !self.paragraphs.is_empty() && self.paragraphs.len() != newlines {
            return Err(AppError::InvalidStyledText(format!(
                "{} paragraph entries for {} newlines",
                self.paragraphs.len(),
                newlines
            )));
        }
        Ok(())
    }
}

/// One undoable change.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// `removed` was replaced by `inserted` at `offset`.
    Splice {
        offset: usize,
        removed: StyledText,
        inserted: StyledText,
    },
    /// Runs starting at `offset` changed from `before` to `after`.
    Format {
        offset: usize,
        before: Vec<Run>,
        after: Vec<Run>,
    },
    /// Paragraph attributes of lines `first_line..` changed.
    Paragraph {
        first_line: usize,
        before: Vec<ParagraphAttrs>,
        after: Vec<ParagraphAttrs>,
    },
}

impl Edit {
    /// Caret position after the edit has been applied.
    pub fn end_after_apply(&self) -> Option<usize> {
        match self {
            Edit::Splice {
                offset, inserted, ..
            } => Some(offset + inserted.char_len()),
            Edit::Format { offset, after, .. } => {
                Some(offset + after.iter().map(|r| r.len).sum::<usize>())
            }
            Edit::Paragraph { .. } => None,
        }
    }

    /// Caret position after the edit has been reverted.
    pub fn end_after_revert(&self) -> Option<usize> {
        match self {
            Edit::Splice {
                offset, removed, ..
            } => Some(offset + removed.char_len()),
            Edit::Format { offset, before, .. } => {
                Some(offset + before.iter().map(|r| r.len).sum::<usize>())
            }
            Edit::Paragraph { .. } => None,
        }
    }

    /// Try to fold a freshly typed char into this edit.
    fn absorb(&mut self, next: &Edit) -> bool {
        let (
            Edit::Splice {
                offset,
                removed,
                inserted,
            },
            Edit::Splice {
                offset: next_offset,
                removed: next_removed,
                inserted: next_inserted,
            },
        ) = (self, next)
        else {
            return false;
        };

        if !removed.is_empty() || !next_removed.is_empty() {
            return false;
        }
        if *next_offset != *offset + inserted.char_len() {
            return false;
        }
        let mut typed = next_inserted.text.chars();
        let (Some(ch), None) = (typed.next(), typed.next()) else {
            return false;
        };
        if ch == '\n' || inserted.text.contains('\n') {
            return false;
        }
        // A new word starts a new undo step.
        let prev_is_space = inserted.text.chars().last().is_some_and(char::is_whitespace);
        if prev_is_space && !ch.is_whitespace() {
            return false;
        }

        inserted.text.push(ch);
        let mut runs = std::mem::take(&mut inserted.runs);
        runs.extend(next_inserted.runs.iter().cloned());
        inserted.runs = StyleRuns::from_runs(runs).into_runs();
        true
    }
}

/// An edit tagged with the id of the document state it leads to.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    id: u64,
    pub edit: Edit,
}

/// Bounded undo/redo stacks.
///
/// Every state reachable by undo/redo has an id; `state()` names the
/// current one so a saved state can be recognised again.
#[derive(Debug)]
pub struct History {
    undo: VecDeque<Entry>,
    redo: Vec<Entry>,
    limit: usize,
    coalesce: bool,
    /// State below the oldest undo entry.
    base: u64,
    next_id: u64,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
            coalesce: false,
            base: 0,
            next_id: 1,
        }
    }

    fn fresh_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Id of the current state.
    pub fn state(&self) -> u64 {
        self.undo.back().map_or(self.base, |entry| entry.id)
    }

    /// Record a new edit; clears the redo stack.
    pub fn record(&mut self, edit: Edit) {
        if self.limit == 0 {
            self.base = self.fresh_id();
            return;
        }
        self.redo.clear();
        if self.coalesce {
            let id = self.fresh_id();
            if let Some(last) = self.undo.back_mut() {
                if last.edit.absorb(&edit) {
                    last.id = id;
                    return;
                }
            }
        }
        self.coalesce = matches!(&edit, Edit::Splice { removed, .. } if removed.is_empty());
        let id = self.fresh_id();
        self.push_undo(Entry { id, edit });
    }

    /// Stop merging typed chars into the last edit (caret moved, etc).
    pub fn break_coalescing(&mut self) {
        self.coalesce = false;
    }

    pub fn take_undo(&mut self) -> Option<Entry> {
        self.coalesce = false;
        self.undo.pop_back()
    }

    pub fn take_redo(&mut self) -> Option<Entry> {
        self.coalesce = false;
        self.redo.pop()
    }

    pub fn push_redo(&mut self, entry: Entry) {
        self.redo.push(entry);
    }

    /// Put a redone edit back on the undo stack without touching redo.
    pub fn push_undo(&mut self, entry: Entry) {
        self.undo.push_back(entry);
        self.trim();
    }

    fn trim(&mut self) {
        while self.undo.len() > self.limit {
            if let Some(dropped) = self.undo.pop_front() {
                self.base = dropped.id;
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.trim();
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.coalesce = false;
        self.base = self.fresh_id();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::domain::style::CharAttrs;

    fn typed(offset: usize, ch: &str) -> Edit {
        Edit::Splice {
            offset,
            removed: StyledText::default(),
            inserted: StyledText {
                text: ch.to_string(),
                runs: vec![Run::new(ch.chars().count(), CharAttrs::default())],
                paragraphs: Vec::new(),
            },
        }
    }

    #[test]
    fn test_typing_coalesces_within_word() {
        let mut history = History::new(10);
        history.record(typed(0, "a"));
        history.record(typed(1, "b"));
        history.record(typed(2, "c"));
        let edit = history.take_undo().unwrap().edit;
        assert!(!history.can_undo());
        match edit {
            Edit::Splice { inserted, .. } => {
                assert_eq!(inserted.text, "abc");
                assert_eq!(inserted.runs, vec![Run::new(3, CharAttrs::default())]);
            }
            other => panic!("unexpected edit {:?}", other),
        }
    }

    #[test]
    fn test_new_word_starts_new_step() {
        let mut history = History::new(10);
        history.record(typed(0, "a"));
        history.record(typed(1, " "));
        history.record(typed(2, "b"));
        assert!(history.take_undo().is_some());
        assert!(history.take_undo().is_some());
        assert!(history.take_undo().is_none());
    }

    #[test]
    fn test_break_coalescing() {
        let mut history = History::new(10);
        history.record(typed(0, "a"));
        history.break_coalescing();
        history.record(typed(1, "b"));
        assert!(history.take_undo().is_some());
        assert!(history.can_undo());
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::new(2);
        history.record(typed(0, "a"));
        history.break_coalescing();
        history.record(typed(5, "b"));
        history.break_coalescing();
        history.record(typed(9, "c"));
        assert_eq!(history.take_undo().map(|e| e.edit), Some(typed(9, "c")));
        assert_eq!(history.take_undo().map(|e| e.edit), Some(typed(5, "b")));
        assert_eq!(history.take_undo(), None);
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new(10);
        history.record(typed(0, "a"));
        let entry = history.take_undo().unwrap();
        history.push_redo(entry);
        assert!(history.can_redo());
        history.record(typed(0, "z"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_zero_limit_records_nothing() {
        let mut history = History::new(0);
        history.record(typed(0, "a"));
        assert!(!history.can_undo());
    }

    #[test]
    fn test_state_returns_after_undo_redo() {
        let mut history = History::new(10);
        let empty = history.state();
        history.record(typed(0, "a"));
        let typed_a = history.state();
        assert_ne!(typed_a, empty);

        let entry = history.take_undo().unwrap();
        assert_eq!(history.state(), empty);
        history.push_redo(entry);
        let entry = history.take_redo().unwrap();
        history.push_undo(entry);
        assert_eq!(history.state(), typed_a);
    }

    #[test]
    fn test_coalesced_typing_changes_state() {
        let mut history = History::new(10);
        history.record(typed(0, "a"));
        let after_a = history.state();
        history.record(typed(1, "b"));
        assert_ne!(history.state(), after_a);
    }

    #[test]
    fn test_dropped_entries_move_base() {
        let mut history = History::new(1);
        let empty = history.state();
        history.record(typed(0, "a"));
        history.break_coalescing();
        history.record(typed(5, "b"));
        history.take_undo();
        assert_ne!(history.state(), empty);
    }
}
