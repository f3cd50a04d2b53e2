use std::ops::Range;
use std::path::Path;

use crate::app::error::{AppError, Result};

/// Extract filename from a file path
///
/// Returns the filename component of a path, or "Unknown" if it can't be extracted.
pub fn extract_filename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != ".")
        .map(|s| s.to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Byte index of char offset `offset`; `None` past the end.
pub fn char_to_byte(text: &str, offset: usize) -> Option<usize> {
    if offset == 0 {
        return Some(0);
    }
    match text.char_indices().nth(offset) {
        Some((b, _)) => Some(b),
        None if text.chars().count() == offset => Some(text.len()),
        None => None,
    }
}

/// Start offsets of every line, in chars.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        let mut len = 0;
        for (i, ch) in text.chars().enumerate() {
            if ch == '\n' {
                starts.push(i + 1);
            }
            len = i + 1;
        }
        Self { starts, len }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Zero-based line containing `offset`.
    pub fn line_of(&self, offset: usize) -> Option<usize> {
        if offset > self.len {
            return None;
        }
        Some(self.starts.partition_point(|&s| s <= offset) - 1)
    }

    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.starts.get(line).copied()
    }
}

/// Caret position as shown in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineColumn {
    /// 1-based.
    pub line: usize,
    /// 0-based distance from the line start.
    pub column: usize,
}

impl Default for LineColumn {
    fn default() -> Self {
        Self { line: 1, column: 0 }
    }
}

impl LineColumn {
    pub fn line_label(&self) -> String {
        format!("Line: {}", self.line)
    }

    pub fn column_label(&self) -> String {
        format!("Column: {}", self.column)
    }
}

/// Translate a caret char offset into line and column.
pub fn caret_line_column(text: &str, caret: usize) -> Result<LineColumn> {
    let index = LineIndex::new(text);
    let line = index.line_of(caret).ok_or(AppError::CaretOutOfRange {
        caret,
        len: index.len,
    })?;
    let start = index.line_start(line).unwrap_or(0);
    Ok(LineColumn {
        line: line + 1,
        column: caret - start,
    })
}

/// Convert a 1-based line number to a char offset in the text
///
/// Returns None if the line number is 0 or beyond the end of the text.
pub fn line_number_to_offset(text: &str, line: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    LineIndex::new(text).line_start(line - 1)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
}

impl SearchOptions {
    pub fn case_sensitive() -> Self {
        Self {
            case_sensitive: true,
            whole_word: false,
        }
    }
}

struct Matcher {
    needle: Vec<char>,
    case_sensitive: bool,
    whole_word: bool,
}

impl Matcher {
    fn new(needle: &str, options: SearchOptions) -> Option<Self> {
        if needle.is_empty() {
            return None;
        }
        Some(Self {
            needle: needle.chars().collect(),
            case_sensitive: options.case_sensitive,
            whole_word: options.whole_word,
        })
    }

    fn matches_at(&self, haystack: &[char], at: usize) -> bool {
        let end = at + self.needle.len();
        end <= haystack.len()
            && haystack[at..end]
                .iter()
                .zip(&self.needle)
                .all(|(a, b)| chars_equal(*a, *b, self.case_sensitive))
            && (!self.whole_word || (is_word_boundary(haystack, at) && is_word_boundary(haystack, end)))
    }

    /// First match starting at or after `start`.
    fn forward(&self, haystack: &[char], start: usize) -> Option<Range<usize>> {
        let last = haystack.len().checked_sub(self.needle.len())?;
        (start..=last)
            .find(|&i| self.matches_at(haystack, i))
            .map(|i| i..i + self.needle.len())
    }

    /// Last match ending at or before `end`.
    fn backward(&self, haystack: &[char], end: usize) -> Option<Range<usize>> {
        let last = end.min(haystack.len()).checked_sub(self.needle.len())?;
        (0..=last)
            .rev()
            .find(|&i| self.matches_at(haystack, i))
            .map(|i| i..i + self.needle.len())
    }
}

fn chars_equal(a: char, b: char, case_sensitive: bool) -> bool {
    if a == b {
        return true;
    }
    !case_sensitive && a.to_lowercase().eq(b.to_lowercase())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// True when exactly one side of `at` is a word char.
fn is_word_boundary(haystack: &[char], at: usize) -> bool {
    let before = at > 0 && is_word_char(haystack[at - 1]);
    let after = haystack.get(at).is_some_and(|&c| is_word_char(c));
    before != after
}

/// Find next occurrence of search string in text
///
/// Returns the char range of the match, or None if not found.
/// Searches from start_pos onwards.
pub fn find_in_text(text: &str, search: &str, start_pos: usize, options: SearchOptions) -> Option<Range<usize>> {
    let matcher = Matcher::new(search, options)?;
    let haystack: Vec<char> = text.chars().collect();
    matcher.forward(&haystack, start_pos)
}

/// Find previous occurrence of search string in text (backward search)
///
/// The match must end at or before start_pos.
pub fn find_in_text_backward(
    text: &str,
    search: &str,
    start_pos: usize,
    options: SearchOptions,
) -> Option<Range<usize>> {
    if start_pos == 0 {
        return None;
    }
    let matcher = Matcher::new(search, options)?;
    let haystack: Vec<char> = text.chars().collect();
    matcher.backward(&haystack, start_pos)
}

/// Every non-overlapping match, left to right.
pub fn find_all(text: &str, search: &str, options: SearchOptions) -> Vec<Range<usize>> {
    let Some(matcher) = Matcher::new(search, options) else {
        return Vec::new();
    };
    let haystack: Vec<char> = text.chars().collect();
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(range) = matcher.forward(&haystack, pos) {
        pos = range.end;
        found.push(range);
    }
    found
}

/// Replace all occurrences of search string with replacement
///
/// Returns (new_text, count_of_replacements)
pub fn replace_all_in_text(text: &str, search: &str, replace: &str, options: SearchOptions) -> (String, usize) {
    let matches = find_all(text, search, options);
    if matches.is_empty() {
        return (text.to_string(), 0);
    }

    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    let mut pos = 0;
    for range in &matches {
        result.extend(chars.by_ref().take(range.start - pos));
        chars.by_ref().take(range.end - range.start).for_each(drop);
        result.push_str(replace);
        pos = range.end;
    }
    result.extend(chars);

    (result, matches.len())
}
