//! Observable store state and the reconciliation steps applied to it
//!
//! Every function here works on the records as they are *now*; callers run
//! them under the store's write lock once a request has settled.

use recipebook_core::{RecordId, SavedRecord};
use serde::Serialize;
use std::collections::HashSet;

/// Snapshot of everything an observer can see
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreState<P> {
    /// Bumped on every change. Observers may drop a snapshot whose version
    /// is below one they have already seen.
    pub version: u64,

    /// At least one request is between issue and settlement
    pub is_loading: bool,

    /// Local view of the collection, in server order
    pub records: Vec<SavedRecord<P>>,

    /// Result of the last successful single-record fetch
    pub selected: Option<SavedRecord<P>>,

    /// Message of the last failed settlement
    pub last_error: Option<String>,

    /// Record picked for edit-in-place
    pub selected_id: Option<RecordId>,

    /// Draft payload for edit-in-place
    pub form_draft: Option<P>,
}

impl<P> Default for StoreState<P> {
    fn default() -> Self {
        Self {
            version: 0,
            is_loading: false,
            records: Vec::new(),
            selected: None,
            last_error: None,
            selected_id: None,
            form_draft: None,
        }
    }
}

impl<P> StoreState<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a record by id
    pub fn record(&self, id: RecordId) -> Option<&SavedRecord<P>> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.record(id).is_some()
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.records.iter().map(|r| r.id).collect()
    }
}

/// Replace the whole collection. Repeated ids keep their first occurrence.
pub fn replace_all<P>(records: &mut Vec<SavedRecord<P>>, fetched: Vec<SavedRecord<P>>) {
    let mut seen = HashSet::with_capacity(fetched.len());
    *records = fetched.into_iter().filter(|r| seen.insert(r.id)).collect();
}

/// Append a created record, or overwrite in place if its id is already held
pub fn upsert<P>(records: &mut Vec<SavedRecord<P>>, created: SavedRecord<P>) {
    match records.iter_mut().find(|r| r.id == created.id) {
        Some(existing) => *existing = created,
        None => records.push(created),
    }
}

/// Replace the entry with the same id, keeping its position.
///
/// Returns false when no entry matched; the records are left alone then.
pub fn replace<P>(records: &mut [SavedRecord<P>], updated: SavedRecord<P>) -> bool {
    match records.iter_mut().find(|r| r.id == updated.id) {
        Some(existing) => {
            *existing = updated;
            true
        }
        None => false,
    }
}

/// Drop the entry with `id`. Returns whether anything was removed.
pub fn remove<P>(records: &mut Vec<SavedRecord<P>>, id: RecordId) -> bool {
    let before = records.len();
    records.retain(|r| r.id != id);
    records.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipebook_core::Recipe;

    fn rec(id: u64, text: &str) -> SavedRecord<Recipe> {
        SavedRecord::new(id, Recipe::new(text))
    }

    #[test]
    fn test_replace_all_collapses_duplicates() {
        let mut records = vec![rec(9, "old")];
        replace_all(&mut records, vec![rec(1, "A"), rec(2, "B"), rec(1, "A again")]);
        assert_eq!(records, vec![rec(1, "A"), rec(2, "B")]);
    }

    #[test]
    fn test_upsert_appends_new_ids() {
        let mut records = vec![rec(1, "A")];
        upsert(&mut records, rec(5, "new recipe"));
        assert_eq!(records, vec![rec(1, "A"), rec(5, "new recipe")]);

        upsert(&mut records, rec(1, "A2"));
        assert_eq!(records, vec![rec(1, "A2"), rec(5, "new recipe")]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut records = vec![rec(1, "A"), rec(2, "B"), rec(3, "C")];
        assert!(replace(&mut records, rec(2, "B2")));
        assert_eq!(records, vec![rec(1, "A"), rec(2, "B2"), rec(3, "C")]);

        assert!(!replace(&mut records, rec(7, "ghost")));
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut records = vec![rec(1, "A"), rec(2, "B")];
        assert!(remove(&mut records, RecordId(1)));
        assert_eq!(records, vec![rec(2, "B")]);

        assert!(!remove(&mut records, RecordId(99)));
        assert_eq!(records, vec![rec(2, "B")]);
    }
}
