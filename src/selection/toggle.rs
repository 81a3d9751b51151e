//! The master-switch toggle as a pure function.
//!
//! Every entry point that toggles a row (click, keyboard, checkbox) goes
//! through [`toggle_in_hierarchy`], which maps the current explicit selection
//! to the next one without touching any store.

use std::collections::HashSet;

use crate::registry::IdentityRegistry;

use super::CheckboxState;

pub trait HierarchyLookup {
    /// Transitive descendants, empty for leaves.
    fn descendants(&self, key: &str) -> &[String];
    fn parent_key(&self, key: &str) -> Option<&str>;
}

impl HierarchyLookup for IdentityRegistry {
    fn descendants(&self, key: &str) -> &[String] {
        IdentityRegistry::descendants(self, key)
    }

    fn parent_key(&self, key: &str) -> Option<&str> {
        IdentityRegistry::parent_key(self, key)
    }
}

/// Treats every key as a parentless leaf.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHierarchy;

impl HierarchyLookup for NoHierarchy {
    fn descendants(&self, _key: &str) -> &[String] {
        &[]
    }

    fn parent_key(&self, _key: &str) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorUpdate {
    Keep,
    Set(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleResult {
    pub selection: Vec<String>,
    pub anchor: AnchorUpdate,
}

/// Leaves are checked iff selected. A parent is checked only when it is
/// itself selected; selected descendants alone make it indeterminate.
pub fn checkbox_state<L>(is_selected: impl Fn(&str) -> bool, key: &str, lookup: &L) -> CheckboxState
where
    L: HierarchyLookup + ?Sized,
{
    let descendants = lookup.descendants(key);
    if is_selected(key) {
        return CheckboxState::Checked;
    }
    if !descendants.is_empty() && descendants.iter().any(|d| is_selected(d)) {
        CheckboxState::Indeterminate
    } else {
        CheckboxState::Unchecked
    }
}

pub fn toggle_in_hierarchy<L>(selected: &[String], key: &str, lookup: &L) -> ToggleResult
where
    L: HierarchyLookup + ?Sized,
{
    let set: HashSet<&str> = selected.iter().map(String::as_str).collect();
    let is_selected = |k: &str| set.contains(k);
    let descendants = lookup.descendants(key);

    if descendants.is_empty() {
        if is_selected(key) {
            if let Some(parent) = lookup.parent_key(key) {
                if is_selected(parent) && checkbox_state(is_selected, parent, lookup).is_checked() {
                    return ToggleResult {
                        selection: without(selected, |k| k == key || k == parent),
                        anchor: AnchorUpdate::Keep,
                    };
                }
            }
            return ToggleResult {
                selection: without(selected, |k| k == key),
                anchor: AnchorUpdate::Keep,
            };
        }
        let mut selection = selected.to_vec();
        selection.push(key.to_string());
        return ToggleResult {
            selection,
            anchor: AnchorUpdate::Set(key.to_string()),
        };
    }

    let subtree: HashSet<&str> = std::iter::once(key)
        .chain(descendants.iter().map(String::as_str))
        .collect();
    if checkbox_state(is_selected, key, lookup).is_checked() {
        return ToggleResult {
            selection: without(selected, |k| subtree.contains(k)),
            anchor: AnchorUpdate::Keep,
        };
    }

    let mut selection = without(selected, |k| subtree.contains(k));
    selection.push(key.to_string());
    selection.extend(descendants.iter().cloned());
    ToggleResult {
        selection,
        anchor: AnchorUpdate::Set(key.to_string()),
    }
}

fn without(selected: &[String], drop: impl Fn(&str) -> bool) -> Vec<String> {
    selected.iter().filter(|k| !drop(k)).cloned().collect()
}
