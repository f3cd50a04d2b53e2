use std::path::{Path, PathBuf};

use super::history::{Edit, History, StyledText};
use super::runs::{Run, StyleRuns};
use super::style::{CharAttrs, CharAttrsPatch, ParagraphAttrs};
use crate::app::error::{AppError, Result};
use crate::app::services::text_ops::{
    LineColumn, caret_line_column, char_to_byte, extract_filename,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(pub u64);

/// Content handed over by a file reader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedContent {
    pub text: String,
    /// Empty for formats without styling.
    pub runs: Vec<Run>,
    /// One entry per line, or empty to use defaults.
    pub paragraphs: Vec<ParagraphAttrs>,
}

/// Defaults a fresh document starts with.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDefaults {
    pub char_attrs: CharAttrs,
    pub paragraph: ParagraphAttrs,
    pub undo_limit: usize,
}

impl Default for DocumentDefaults {
    fn default() -> Self {
        Self {
            char_attrs: CharAttrs::default(),
            paragraph: ParagraphAttrs::default(),
            undo_limit: 100,
        }
    }
}

/// The styled document: text, character runs, per-line paragraph
/// attributes, caret/selection and edit history.
///
/// All offsets are char offsets.
#[derive(Debug)]
pub struct Document {
    pub id: DocumentId,
    pub file_path: Option<PathBuf>,
    pub display_name: String,
    text: String,
    char_len: usize,
    runs: StyleRuns,
    paragraphs: Vec<ParagraphAttrs>,
    /// Attributes for text typed into an empty document.
    typing_attrs: CharAttrs,
    default_paragraph: ParagraphAttrs,
    caret: usize,
    anchor: usize,
    dirty: bool,
    /// History state at the last save, if still reachable.
    clean_state: Option<u64>,
    history: History,
}

impl Document {
    pub fn new_untitled(id: DocumentId, defaults: &DocumentDefaults) -> Self {
        Self {
            id,
            file_path: None,
            display_name: "Untitled".to_string(),
            text: String::new(),
            char_len: 0,
            runs: StyleRuns::default(),
            paragraphs: vec![defaults.paragraph],
            typing_attrs: defaults.char_attrs.clone(),
            default_paragraph: defaults.paragraph,
            caret: 0,
            anchor: 0,
            dirty: false,
            clean_state: Some(0),
            history: History::new(defaults.undo_limit),
        }
    }

    /// Build a clean document from file content. Runs or paragraph tables
    /// that do not fit the text are replaced by defaults.
    pub fn from_loaded(
        id: DocumentId,
        path: &Path,
        content: LoadedContent,
        defaults: &DocumentDefaults,
    ) -> Self {
        let mut doc = Self::new_untitled(id, defaults);
        doc.set_text(&content.text);

        if !content.runs.is_empty() {
            let runs = StyleRuns::from_runs(content.runs);
            if runs.len() == doc.char_len {
                doc.runs = runs;
            } else {
                tracing::warn!(
                    "Ignoring styles of {:?}: runs cover {} chars, text has {}",
                    path,
                    runs.len(),
                    doc.char_len
                );
            }
        }
        if content.paragraphs.len() == doc.paragraphs.len() {
            doc.paragraphs = content.paragraphs;
        } else if !content.paragraphs.is_empty() {
            tracing::warn!(
                "Ignoring paragraph attributes of {:?}: {} entries for {} lines",
                path,
                content.paragraphs.len(),
                doc.paragraphs.len()
            );
        }

        doc.file_path = Some(path.to_path_buf());
        doc.update_display_name();
        doc.mark_clean();
        doc
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len_chars(&self) -> usize {
        self.char_len
    }

    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }

    pub fn runs(&self) -> &StyleRuns {
        &self.runs
    }

    pub fn paragraphs(&self) -> &[ParagraphAttrs] {
        &self.paragraphs
    }

    pub fn line_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Attributes at `offset`, falling back to the typing attributes.
    pub fn char_attrs_at(&self, offset: usize) -> &CharAttrs {
        self.runs.attrs_at(offset).unwrap_or(&self.typing_attrs)
    }

    pub fn typing_attrs(&self) -> &CharAttrs {
        &self.typing_attrs
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
        self.clean_state = Some(self.history.state());
        self.history.break_coalescing();
    }

    pub fn update_display_name(&mut self) {
        if let Some(ref path) = self.file_path {
            self.display_name = extract_filename(&path.to_string_lossy());
        }
    }

    /// Replace the whole content. Styles reset and history is cleared.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.char_len = text.chars().count();
        self.runs = StyleRuns::new(self.char_len, self.typing_attrs.clone());
        self.paragraphs = vec![self.default_paragraph; text.matches('\n').count() + 1];
        self.caret = 0;
        self.anchor = 0;
        self.history.clear();
        self.dirty = true;
        self.clean_state = None;
    }

    // --- caret and selection ---

    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Move the caret (clamped to the text) and drop the selection.
    pub fn set_caret(&mut self, offset: usize) {
        self.caret = offset.min(self.char_len);
        self.anchor = self.caret;
        self.history.break_coalescing();
    }

    /// Select `start..end`; the caret ends up at `end`.
    pub fn select(&mut self, start: usize, end: usize) {
        self.anchor = start.min(self.char_len);
        self.caret = end.min(self.char_len);
        self.history.break_coalescing();
    }

    pub fn select_all(&mut self) {
        self.select(0, self.char_len);
    }

    /// Ordered selection bounds, `None` when nothing is selected.
    pub fn selection(&self) -> Option<(usize, usize)> {
        if self.anchor == self.caret {
            None
        } else {
            Some((self.anchor.min(self.caret), self.anchor.max(self.caret)))
        }
    }

    pub fn selected_text(&self) -> Option<String> {
        let (start, end) = self.selection()?;
        Some(self.slice_text(start, end))
    }

    /// Caret line/column; an out-of-range caret shows the default position.
    pub fn line_column(&self) -> LineColumn {
        caret_line_column(&self.text, self.caret).unwrap_or_else(|e| {
            tracing::debug!("Resetting caret position display: {}", e);
            LineColumn::default()
        })
    }

    // --- editing ---

    pub fn insert(&mut self, offset: usize, text: &str) -> Result<()> {
        self.replace(offset, offset, text)
    }

    pub fn delete(&mut self, start: usize, end: usize) -> Result<()> {
        self.replace(start, end, "")
    }

    /// Replace `start..end` with plain text that inherits surrounding style.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> Result<()> {
        self.replace_styled(start, end, &StyledText::plain(text))
    }

    pub fn insert_styled(&mut self, offset: usize, styled: &StyledText) -> Result<()> {
        self.replace_styled(offset, offset, styled)
    }

    pub fn replace_styled(&mut self, start: usize, end: usize, styled: &StyledText) -> Result<()> {
        self.check_range(start, end)?;
        styled.validate()?;
        if start == end && styled.is_empty() {
            return Ok(());
        }
        let edit = self.splice_recorded(start, end, styled);
        self.history.record(edit);
        Ok(())
    }

    /// Replace several disjoint ranges as a single undo step. A range that
    /// overlaps an earlier one is skipped. Each replacement takes the
    /// attributes of the char before its range.
    pub fn replace_ranges(&mut self, ranges: &[(usize, usize)], text: &str) -> Result<usize> {
        for &(start, end) in ranges {
            self.check_range(start, end)?;
        }
        let mut sorted = ranges.to_vec();
        sorted.sort_unstable();
        let mut kept: Vec<(usize, usize)> = Vec::with_capacity(sorted.len());
        for (start, end) in sorted {
            if kept.last().is_some_and(|&(_, prev_end)| start < prev_end) {
                continue;
            }
            kept.push((start, end));
        }
        let (Some(&(span_start, first_end)), Some(&(_, span_end))) = (kept.first(), kept.last()) else {
            return Ok(0);
        };

        let span = self.styled_slice_unchecked(span_start, span_end);
        let inherited = if span_start > 0 {
            self.runs.attrs_at(span_start - 1)
        } else {
            self.runs.attrs_at(first_end)
        }
        .cloned()
        .unwrap_or_else(|| self.typing_attrs.clone());
        let mut line_attrs = self.paragraphs[self.line_of(span_start)];

        let replacement_len = text.chars().count();
        let replacement_newlines = text.matches('\n').count();
        let mut pending = kept
            .iter()
            .map(|&(start, end)| (start - span_start, end - span_start))
            .peekable();
        let mut chars = span.text.chars();
        let mut attrs = span
            .runs
            .iter()
            .flat_map(|r| std::iter::repeat_n(&r.attrs, r.len));
        let mut paragraphs = span.paragraphs.iter().copied();
        let mut prev_attrs = &inherited;
        let mut skip_until = 0;
        let mut out = StyledText::default();

        for i in 0..=span_end - span_start {
            while let Some((_, end)) = pending.next_if(|&(start, _)| start == i) {
                out.text.push_str(text);
                push_run(&mut out.runs, replacement_len, prev_attrs);
                out.paragraphs
                    .extend(std::iter::repeat_n(line_attrs, replacement_newlines));
                skip_until = end;
            }
            let (Some(ch), Some(ch_attrs)) = (chars.next(), attrs.next()) else {
                break;
            };
            let paragraph = if ch == '\n' { paragraphs.next() } else { None };
            if i >= skip_until {
                out.text.push(ch);
                push_run(&mut out.runs, 1, ch_attrs);
                if let Some(p) = paragraph {
                    out.paragraphs.push(p);
                    line_attrs = p;
                }
            }
            prev_attrs = ch_attrs;
        }

        self.history.break_coalescing();
        let edit = self.splice_recorded(span_start, span_end, &out);
        self.history.record(edit);
        self.history.break_coalescing();
        Ok(kept.len())
    }

    /// Text and styles of `start..end`.
    pub fn styled_slice(&self, start: usize, end: usize) -> Result<StyledText> {
        self.check_range(start, end)?;
        Ok(self.styled_slice_unchecked(start, end))
    }

    // --- styling ---

    pub fn apply_char_attrs(&mut self, start: usize, end: usize, patch: &CharAttrsPatch) -> Result<()> {
        self.check_range(start, end)?;
        if start == end || patch.is_empty() {
            return Ok(());
        }
        let before = self.runs.apply(start, end - start, patch);
        let after = self.runs.slice(start, end - start);
        if before != after {
            self.dirty = true;
            self.history.record(Edit::Format {
                offset: start,
                before,
                after,
            });
        }
        Ok(())
    }

    /// Style the whole document and everything typed afterwards.
    pub fn apply_char_attrs_to_all(&mut self, patch: &CharAttrsPatch) -> Result<()> {
        self.typing_attrs = patch.apply(&self.typing_attrs);
        self.apply_char_attrs(0, self.char_len, patch)
    }

    /// Set the paragraph attributes of every line overlapping `start..end`.
    pub fn set_paragraph_attrs(&mut self, start: usize, end: usize, attrs: ParagraphAttrs) -> Result<()> {
        self.check_range(start, end)?;
        let first_line = self.line_of(start);
        let last_line = self.line_of(end);
        let before = self.paragraphs[first_line..=last_line].to_vec();
        let after = vec![attrs; before.len()];
        if before == after {
            return Ok(());
        }
        self.paragraphs[first_line..=last_line].copy_from_slice(&after);
        self.dirty = true;
        self.history.record(Edit::Paragraph {
            first_line,
            before,
            after,
        });
        Ok(())
    }

    pub fn set_paragraph_attrs_to_all(&mut self, attrs: ParagraphAttrs) -> Result<()> {
        self.default_paragraph = attrs;
        self.set_paragraph_attrs(0, self.char_len, attrs)
    }

    // --- history ---

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.take_undo() else {
            return false;
        };
        self.revert(&entry.edit);
        if let Some(caret) = entry.edit.end_after_revert() {
            self.caret = caret.min(self.char_len);
            self.anchor = self.caret;
        }
        self.history.push_redo(entry);
        self.refresh_dirty();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.history.take_redo() else {
            return false;
        };
        self.reapply(&entry.edit);
        if let Some(caret) = entry.edit.end_after_apply() {
            self.caret = caret.min(self.char_len);
            self.anchor = self.caret;
        }
        self.history.push_undo(entry);
        self.refresh_dirty();
        true
    }

    fn refresh_dirty(&mut self) {
        self.dirty = self.clean_state != Some(self.history.state());
    }

    pub fn set_undo_limit(&mut self, limit: usize) {
        self.history.set_limit(limit);
    }

    fn revert(&mut self, edit: &Edit) {
        match edit {
            Edit::Splice {
                offset,
                removed,
                inserted,
            } => {
                self.splice(*offset, inserted.char_len(), removed);
            }
            Edit::Format { offset, before, .. } => {
                let len = before.iter().map(|r| r.len).sum();
                self.runs.splice(*offset, len, before.clone());
            }
            Edit::Paragraph {
                first_line, before, ..
            } => {
                self.paragraphs[*first_line..*first_line + before.len()].copy_from_slice(before);
            }
        }
    }

    fn reapply(&mut self, edit: &Edit) {
        match edit {
            Edit::Splice {
                offset,
                removed,
                inserted,
            } => {
                self.splice(*offset, removed.char_len(), inserted);
            }
            Edit::Format { offset, after, .. } => {
                let len = after.iter().map(|r| r.len).sum();
                self.runs.splice(*offset, len, after.clone());
            }
            Edit::Paragraph {
                first_line, after, ..
            } => {
                self.paragraphs[*first_line..*first_line + after.len()].copy_from_slice(after);
            }
        }
    }

    // --- internals ---

    fn check_range(&self, start: usize, end: usize) -> Result<()> {
        if start > end || end > self.char_len {
            return Err(AppError::InvalidRange {
                start,
                end,
                len: self.char_len,
            });
        }
        Ok(())
    }

    fn line_of(&self, offset: usize) -> usize {
        self.text.chars().take(offset).filter(|&c| c == '\n').count()
    }

    fn byte_offset(&self, offset: usize) -> usize {
        char_to_byte(&self.text, offset).unwrap_or(self.text.len())
    }

    fn slice_text(&self, start: usize, end: usize) -> String {
        self.text[self.byte_offset(start)..self.byte_offset(end)].to_string()
    }

    fn styled_slice_unchecked(&self, start: usize, end: usize) -> StyledText {
        let text = self.slice_text(start, end);
        let first_line = self.line_of(start);
        let newlines = text.matches('\n').count();
        StyledText {
            runs: self.runs.slice(start, end - start),
            paragraphs: self.paragraphs[first_line + 1..first_line + 1 + newlines].to_vec(),
            text,
        }
    }

    /// Splice and return the edit describing what actually changed.
    fn splice_recorded(&mut self, start: usize, end: usize, styled: &StyledText) -> Edit {
        let removed = self.splice(start, end - start, styled);
        let inserted = self.styled_slice_unchecked(start, start + styled.char_len());
        Edit::Splice {
            offset: start,
            removed,
            inserted,
        }
    }

    /// Raw replace of `remove_len` chars at `offset`; not recorded.
    fn splice(&mut self, offset: usize, remove_len: usize, insert: &StyledText) -> StyledText {
        let end = offset + remove_len;
        let removed = self.styled_slice_unchecked(offset, end);
        let first_line = self.line_of(offset);

        let removed_lines = removed.paragraphs.len();
        self.paragraphs
            .drain(first_line + 1..first_line + 1 + removed_lines);

        let (byte_start, byte_end) = (self.byte_offset(offset), self.byte_offset(end));
        self.text.replace_range(byte_start..byte_end, &insert.text);

        let insert_len = insert.char_len();
        self.runs.splice(offset, remove_len, Vec::new());
        if insert.runs.is_empty() {
            self.runs
                .insert_inherited(offset, insert_len, &self.typing_attrs);
        } else {
            self.runs.splice(offset, 0, insert.runs.clone());
        }

        let new_lines = insert.text.matches('\n').count();
        let fresh: Vec<ParagraphAttrs> = if insert.paragraphs.len() == new_lines {
            insert.paragraphs.clone()
        } else {
            vec![self.paragraphs[first_line]; new_lines]
        };
        self.paragraphs
            .splice(first_line + 1..first_line + 1, fresh);

        self.char_len = self.char_len - remove_len + insert_len;
        self.caret = offset + insert_len;
        self.anchor = self.caret;
        self.dirty = true;
        removed
    }
}

fn push_run(runs: &mut Vec<Run>, len: usize, attrs: &CharAttrs) {
    if len == 0 {
        return;
    }
    match runs.last_mut() {
        Some(last) if last.attrs == *attrs => last.len += len,
        _ => runs.push(Run::new(len, attrs.clone())),
    }
}
