use std::ops::Range;

use super::text_ops::{SearchOptions, find_in_text, find_in_text_backward};
use crate::app::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindResult {
    Found(Range<usize>),
    /// Nothing after the search position; the next search starts over.
    Wrapped,
    NotFound,
}

/// Remembers where the last search stopped so repeated "Find Next"
/// walks through the document and wraps around.
///
/// The stored position is only used while the caret is still where the
/// last search left it; otherwise the search starts at the caret.
#[derive(Debug, Default)]
pub struct FindSession {
    query: String,
    position: usize,
    /// Caret position expected on the next call.
    left_at: Option<usize>,
}

impl FindSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.query.clear();
        self.position = 0;
        self.left_at = None;
    }

    /// Continue the next search for `query` at `position`, the caret
    /// being there too.
    pub fn resume_at(&mut self, query: &str, position: usize) {
        self.query = query.to_string();
        self.position = position;
        self.left_at = Some(position);
    }

    /// Search forward from `caret`, or from where the previous search for
    /// the same query stopped if the caret has not moved since.
    pub fn find_next(&mut self, text: &str, query: &str, caret: usize, options: SearchOptions) -> Result<FindResult> {
        if query.is_empty() {
            return Err(AppError::EmptySearch);
        }

        let start_pos = if self.query == query && self.left_at == Some(caret) {
            self.position
        } else {
            self.query = query.to_string();
            caret
        };

        if let Some(range) = find_in_text(text, query, start_pos, options) {
            self.position = range.end;
            self.left_at = Some(range.end);
            return Ok(FindResult::Found(range));
        }
        if start_pos > 0 {
            self.position = 0;
            self.left_at = Some(caret);
            Ok(FindResult::Wrapped)
        } else {
            self.left_at = None;
            Ok(FindResult::NotFound)
        }
    }

    /// Search backwards for a match ending at or before `from`.
    pub fn find_previous(
        &mut self,
        text: &str,
        query: &str,
        from: usize,
        options: SearchOptions,
    ) -> Result<FindResult> {
        if query.is_empty() {
            return Err(AppError::EmptySearch);
        }
        self.query = query.to_string();
        self.left_at = None;

        if let Some(range) = find_in_text_backward(text, query, from, options) {
            self.position = range.end;
            return Ok(FindResult::Found(range));
        }
        if from < text.chars().count() {
            Ok(FindResult::Wrapped)
        } else {
            Ok(FindResult::NotFound)
        }
    }
}
