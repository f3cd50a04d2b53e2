use super::style::{CharAttrs, CharAttrsPatch};

/// A stretch of `len` chars sharing the same attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub len: usize,
    pub attrs: CharAttrs,
}

impl Run {
    pub fn new(len: usize, attrs: CharAttrs) -> Self {
        Self { len, attrs }
    }
}

/// Character attribute runs over a document, addressed by char offset.
///
/// Run lengths always sum to the document length, no run is empty, and
/// neighbouring runs never carry equal attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleRuns {
    runs: Vec<Run>,
}

impl StyleRuns {
    pub fn new(len: usize, attrs: CharAttrs) -> Self {
        Self::from_runs(vec![Run::new(len, attrs)])
    }

    pub fn from_runs(runs: Vec<Run>) -> Self {
        let mut table = Self { runs };
        table.normalize();
        table
    }

    pub fn into_runs(self) -> Vec<Run> {
        self.runs
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn iter(&self) -> impl Iterator<Item = &Run> {
        self.runs.iter()
    }

    pub fn len(&self) -> usize {
        self.runs.iter().map(|r| r.len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Attributes of the char at `offset`. The end offset resolves to the
    /// last run so the caret at end-of-text still has attributes.
    pub fn attrs_at(&self, offset: usize) -> Option<&CharAttrs> {
        let mut pos = 0;
        for run in &self.runs {
            if offset < pos + run.len {
                return Some(&run.attrs);
            }
            pos += run.len;
        }
        self.runs.last().map(|r| &r.attrs)
    }

    /// Copy of the runs covering `start..start + len`, clipped to the table.
    pub fn slice(&self, start: usize, len: usize) -> Vec<Run> {
        let end = start.saturating_add(len);
        let mut out = Vec::new();
        let mut pos = 0;
        for run in &self.runs {
            let run_end = pos + run.len;
            let lo = start.max(pos);
            let hi = end.min(run_end);
            if lo < hi {
                out.push(Run::new(hi - lo, run.attrs.clone()));
            }
            if run_end >= end {
                break;
            }
            pos = run_end;
        }
        out
    }

    /// Replace the runs of `start..start + len` with `replacement`.
    /// Returns the runs that were removed.
    pub fn splice(&mut self, start: usize, len: usize, replacement: Vec<Run>) -> Vec<Run> {
        let total = self.len();
        let start = start.min(total);
        let end = start.saturating_add(len).min(total);
        let i = self.split_at(start);
        let j = self.split_at(end);
        let removed: Vec<Run> = self
            .runs
            .splice(i..j, replacement.into_iter().filter(|r| r.len > 0))
            .collect();
        self.normalize();
        removed
    }

    /// Insert `len` chars that take the attributes of the char before
    /// `offset` (or the first char when inserting at 0).
    pub fn insert_inherited(&mut self, offset: usize, len: usize, fallback: &CharAttrs) {
        if len == 0 {
            return;
        }
        let attrs = if offset > 0 {
            self.attrs_at(offset - 1)
        } else {
            self.attrs_at(0)
        }
        .cloned()
        .unwrap_or_else(|| fallback.clone());
        self.splice(offset, 0, vec![Run::new(len, attrs)]);
    }

    /// Patch every run in `start..start + len`. Returns the previous runs.
    pub fn apply(&mut self, start: usize, len: usize, patch: &CharAttrsPatch) -> Vec<Run> {
        let before = self.slice(start, len);
        let after = before
            .iter()
            .map(|r| Run::new(r.len, patch.apply(&r.attrs)))
            .collect();
        self.splice(start, len, after);
        before
    }

    /// Split so that a run boundary sits at `offset`; returns the index of
    /// the first run starting at or after it.
    fn split_at(&mut self, offset: usize) -> usize {
        let mut pos = 0;
        for i in 0..self.runs.len() {
            if pos == offset {
                return i;
            }
            let run_len = self.runs[i].len;
            if offset < pos + run_len {
                let head = offset - pos;
                let tail = Run::new(run_len - head, self.runs[i].attrs.clone());
                self.runs[i].len = head;
                self.runs.insert(i + 1, tail);
                return i + 1;
            }
            pos += run_len;
        }
        self.runs.len()
    }

    fn normalize(&mut self) {
        let mut merged: Vec<Run> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.len == 0 {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.attrs == run.attrs => last.len += run.len,
                _ => merged.push(run),
            }
        }
        self.runs = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::domain::style::Color;

    fn red() -> CharAttrs {
        CharAttrs {
            color: Color::rgb(255, 0, 0),
            ..CharAttrs::default()
        }
    }

    #[test]
    fn test_new_empty_has_no_runs() {
        let runs = StyleRuns::new(0, CharAttrs::default());
        assert!(runs.is_empty());
        assert_eq!(runs.len(), 0);
        assert_eq!(runs.attrs_at(0), None);
    }

    #[test]
    fn test_apply_splits_and_reports_previous() {
        let mut runs = StyleRuns::new(10, CharAttrs::default());
        let before = runs.apply(3, 4, &CharAttrsPatch::color(Color::rgb(255, 0, 0)));
        assert_eq!(before, vec![Run::new(4, CharAttrs::default())]);
        assert_eq!(runs.runs().len(), 3);
        assert_eq!(runs.len(), 10);
        assert_eq!(runs.attrs_at(2), Some(&CharAttrs::default()));
        assert_eq!(runs.attrs_at(3), Some(&red()));
        assert_eq!(runs.attrs_at(6), Some(&red()));
        assert_eq!(runs.attrs_at(7), Some(&CharAttrs::default()));
    }

    #[test]
    fn test_adjacent_equal_runs_merge() {
        let mut runs = StyleRuns::new(6, CharAttrs::default());
        runs.apply(0, 3, &CharAttrsPatch::color(Color::rgb(255, 0, 0)));
        runs.apply(3, 3, &CharAttrsPatch::color(Color::rgb(255, 0, 0)));
        assert_eq!(runs.runs(), &[Run::new(6, red())]);
    }

    #[test]
    fn test_insert_inherits_previous_char() {
        let mut runs = StyleRuns::from_runs(vec![
            Run::new(2, CharAttrs::default()),
            Run::new(2, red()),
        ]);
        runs.insert_inherited(4, 3, &CharAttrs::default());
        assert_eq!(runs.len(), 7);
        assert_eq!(runs.attrs_at(6), Some(&red()));

        runs.insert_inherited(0, 1, &red());
        assert_eq!(runs.attrs_at(0), Some(&CharAttrs::default()));
        assert_eq!(runs.runs()[0].len, 3);
    }

    #[test]
    fn test_insert_into_empty_uses_fallback() {
        let mut runs = StyleRuns::default();
        runs.insert_inherited(0, 5, &red());
        assert_eq!(runs.runs(), &[Run::new(5, red())]);
    }

    #[test]
    fn test_splice_returns_removed() {
        let mut runs = StyleRuns::from_runs(vec![
            Run::new(3, CharAttrs::default()),
            Run::new(3, red()),
        ]);
        let removed = runs.splice(2, 2, Vec::new());
        assert_eq!(
            removed,
            vec![Run::new(1, CharAttrs::default()), Run::new(1, red())]
        );
        assert_eq!(runs.len(), 4);

        runs.splice(2, 0, removed);
        assert_eq!(
            runs.runs(),
            &[Run::new(3, CharAttrs::default()), Run::new(3, red())]
        );
    }

    #[test]
    fn test_slice_clips_to_table() {
        let runs = StyleRuns::new(4, CharAttrs::default());
        assert_eq!(runs.slice(2, 10), vec![Run::new(2, CharAttrs::default())]);
        assert!(runs.slice(4, 3).is_empty());
    }

    #[test]
    fn test_attrs_at_end_resolves_last_run() {
        let runs = StyleRuns::from_runs(vec![
            Run::new(1, CharAttrs::default()),
            Run::new(1, red()),
        ]);
        assert_eq!(runs.attrs_at(2), Some(&red()));
    }
}
