//! Selection set over enhancement jobs.
//!
//! Independent of the job lifecycle: selecting a job does not touch its
//! status, and ids are pruned only when the referenced job is deleted.

use std::collections::HashSet;

use crate::types::JobId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: HashSet<JobId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &JobId) -> bool {
        self.ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Flip membership of `id`; returns whether it is now selected.
    pub fn toggle(&mut self, id: JobId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn insert(&mut self, id: JobId) {
        self.ids.insert(id);
    }

    pub fn remove(&mut self, id: &JobId) -> bool {
        self.ids.remove(id)
    }

    /// Replace the whole selection.
    pub fn replace(&mut self, ids: impl IntoIterator<Item = JobId>) {
        self.ids = ids.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobId> {
        self.ids.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_adds_then_removes() {
        let mut sel = SelectionSet::new();
        let id = uuid::Uuid::new_v4();
        assert!(sel.toggle(id));
        assert!(sel.contains(&id));
        assert!(!sel.toggle(id));
        assert!(sel.is_empty());
    }
}
