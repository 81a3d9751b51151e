//! Selection: storage seam, tri-state checkbox derivation, range selection.
//!
//! The selected-key list itself lives in a [`SelectionStore`] owned by the
//! host. [`SelectionModel`] only derives from it and issues commands to it.

pub mod model;
pub mod toggle;

use std::fmt;

pub use model::{BulkState, SelectionMode, SelectionModel, SelectionSnapshot, actionable_kind};
pub use toggle::{AnchorUpdate, HierarchyLookup, ToggleResult, checkbox_state, toggle_in_hierarchy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckboxState {
    Checked,
    Indeterminate,
    Unchecked,
}

impl CheckboxState {
    pub fn is_checked(self) -> bool {
        self == CheckboxState::Checked
    }
}

impl fmt::Display for CheckboxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CheckboxState::Checked => "checked",
            CheckboxState::Indeterminate => "indeterminate",
            CheckboxState::Unchecked => "unchecked",
        };
        write!(f, "{}", s)
    }
}

/// Externally owned list of selected keys.
pub trait SelectionStore {
    fn selected_keys(&self) -> &[String];

    /// Adds the key if absent, removes it otherwise.
    fn toggle(&mut self, key: &str);

    /// Replaces the whole selection.
    fn select_many(&mut self, keys: Vec<String>);

    fn clear(&mut self);
}

/// Insertion-ordered, duplicate-free key list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySelection {
    keys: Vec<String>,
}

impl KeySelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Self::new();
        selection.select_many(keys.into_iter().map(Into::into).collect());
        selection
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl SelectionStore for KeySelection {
    fn selected_keys(&self) -> &[String] {
        &self.keys
    }

    fn toggle(&mut self, key: &str) {
        if let Some(pos) = self.keys.iter().position(|k| k == key) {
            self.keys.remove(pos);
        } else {
            self.keys.push(key.to_string());
        }
    }

    fn select_many(&mut self, keys: Vec<String>) {
        self.keys.clear();
        for key in keys {
            if !self.keys.contains(&key) {
                self.keys.push(key);
            }
        }
    }

    fn clear(&mut self) {
        self.keys.clear();
    }
}
