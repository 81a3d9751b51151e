//! Row expand/collapse state, keyed by entity id.

use std::collections::BTreeSet;

pub trait ExpandState {
    fn is_expanded(&self, id: &str) -> bool;
    fn expand(&mut self, id: &str);
    fn collapse(&mut self, id: &str);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedSet {
    ids: BTreeSet<String>,
}

impl ExpandedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    pub fn expand_all<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids.extend(ids.into_iter().map(Into::into));
    }

    pub fn collapse_all(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl ExpandState for ExpandedSet {
    fn is_expanded(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn expand(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    fn collapse(&mut self, id: &str) {
        self.ids.remove(id);
    }
}

/// Everything expanded. Handy for building a registry over the full tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllExpanded;

impl ExpandState for AllExpanded {
    fn is_expanded(&self, _id: &str) -> bool {
        true
    }

    fn expand(&mut self, _id: &str) {}

    fn collapse(&mut self, _id: &str) {}
}
