//! The viewer pointer over the URL deck.
//!
//! `ViewState` is a plain value owned by the app. Every list refresh goes
//! through [`ViewState::refresh`], which relocates the pointer by entry id so
//! that reorders and unrelated deletes never change what is being viewed.

use crate::storage::UrlEntry;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    entries: Vec<UrlEntry>,
    current: usize,
}

impl ViewState {
    pub fn new(entries: Vec<UrlEntry>) -> Self {
        Self {
            entries,
            current: 0,
        }
    }

    pub fn entries(&self) -> &[UrlEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids in display order, the input for reorder calculations.
    pub fn ids(&self) -> Vec<i64> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// Replace the entries with a fresh read from the store.
    ///
    /// With `keep`, the pointer follows the previously current entry to its
    /// new position. If that entry is gone, or `keep` is false, it resets
    /// to the head.
    pub fn refresh(&mut self, entries: Vec<UrlEntry>, keep: bool) {
        let previous = if keep {
            self.current_entry().map(|e| e.id)
        } else {
            None
        };
        self.entries = entries;
        self.current = previous
            .and_then(|id| self.position_of(id))
            .unwrap_or(0);
    }

    /// Position of the viewed entry, clamped into range. `None` when empty.
    pub fn current_index(&self) -> Option<usize> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.current.min(self.entries.len() - 1))
        }
    }

    pub fn current_entry(&self) -> Option<&UrlEntry> {
        self.current_index().map(|i| &self.entries[i])
    }

    /// Advance circularly; the last entry wraps to the first.
    pub fn next(&mut self) {
        if let Some(i) = self.current_index() {
            self.current = (i + 1) % self.entries.len();
        }
    }

    /// Step back circularly; the first entry wraps to the last.
    pub fn prev(&mut self) {
        if let Some(i) = self.current_index() {
            let n = self.entries.len();
            self.current = (i + n - 1) % n;
        }
    }

    /// Point at the entry with `id`. Returns `false` (pointer unchanged) if absent.
    pub fn select_id(&mut self, id: i64) -> bool {
        match self.position_of(id) {
            Some(pos) => {
                self.current = pos;
                true
            }
            None => false,
        }
    }

    /// Point at the first entry whose URL equals `url`.
    pub fn select_url(&mut self, url: &str) -> bool {
        match self.entries.iter().position(|e| e.url == url) {
            Some(pos) => {
                self.current = pos;
                true
            }
            None => false,
        }
    }

    fn position_of(&self, id: i64) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(id: i64, order: i64) -> UrlEntry {
        UrlEntry {
            id,
            url: format!("https://example.com/{id}"),
            title: None,
            order,
            created_at: 0,
        }
    }

    fn deck(ids: &[i64]) -> Vec<UrlEntry> {
        ids.iter()
            .enumerate()
            .map(|(i, &id)| entry(id, i as i64))
            .collect()
    }

    #[test]
    fn test_empty_has_no_current() {
        let mut view = ViewState::default();
        assert_eq!(view.current_index(), None);
        assert!(view.current_entry().is_none());
        view.next();
        view.prev();
        assert_eq!(view.current_index(), None);
    }

    #[test]
    fn test_next_prev_wrap() {
        let mut view = ViewState::new(deck(&[1, 2, 3]));
        view.prev();
        assert_eq!(view.current_entry().map(|e| e.id), Some(3));
        view.next();
        assert_eq!(view.current_entry().map(|e| e.id), Some(1));
        view.next();
        view.next();
        view.next();
        assert_eq!(view.current_entry().map(|e| e.id), Some(1));
    }

    #[test]
    fn test_single_entry_wraps_to_itself() {
        let mut view = ViewState::new(deck(&[7]));
        view.next();
        assert_eq!(view.current_index(), Some(0));
        view.prev();
        assert_eq!(view.current_index(), Some(0));
    }

    #[test]
    fn test_refresh_keep_follows_entry() {
        let mut view = ViewState::new(deck(&[1, 2, 3]));
        assert!(view.select_id(2));
        view.refresh(deck(&[2, 3, 1]), true);
        assert_eq!(view.current_index(), Some(0));
        assert_eq!(view.current_entry().map(|e| e.id), Some(2));
    }

    #[test]
    fn test_refresh_without_keep_resets() {
        let mut view = ViewState::new(deck(&[1, 2, 3]));
        view.select_id(3);
        view.refresh(deck(&[1, 2, 3]), false);
        assert_eq!(view.current_index(), Some(0));
    }

    #[test]
    fn test_refresh_after_current_deleted_resets() {
        let mut view = ViewState::new(deck(&[1, 2, 3]));
        view.select_id(3);
        view.refresh(deck(&[1, 2]), true);
        assert_eq!(view.current_index(), Some(0));

        view.refresh(Vec::new(), true);
        assert_eq!(view.current_index(), None);
    }

    #[test]
    fn test_delete_other_entry_keeps_logical_current() {
        // a, b, c -> reorder to a, c, b with b current -> delete a
        let mut view = ViewState::new(deck(&[1, 2, 3]));
        view.select_id(2);
        view.refresh(deck(&[1, 3, 2]), true);
        assert_eq!(view.current_index(), Some(2));

        view.refresh(deck(&[3, 2]), true);
        assert_eq!(view.current_index(), Some(1));
        assert_eq!(view.current_entry().map(|e| e.id), Some(2));
    }

    #[test]
    fn test_select_missing_is_noop() {
        let mut view = ViewState::new(deck(&[1, 2]));
        view.select_id(2);
        assert!(!view.select_id(99));
        assert!(!view.select_url("https://nowhere.example/"));
        assert_eq!(view.current_index(), Some(1));
    }

    #[test]
    fn test_select_url() {
        let mut view = ViewState::new(deck(&[4, 5, 6]));
        assert!(view.select_url("https://example.com/6"));
        assert_eq!(view.current_index(), Some(2));
    }
}
