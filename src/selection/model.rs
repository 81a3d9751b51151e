use std::collections::HashSet;

use tracing::debug;

use crate::registry::{IdentityRegistry, KeySchema, kind_of};

use super::toggle::{AnchorUpdate, HierarchyLookup, NoHierarchy, checkbox_state, toggle_in_hierarchy};
use super::{CheckboxState, SelectionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Every key is a leaf.
    Flat,
    /// Parents cascade to descendants and show tri-state checkboxes.
    #[default]
    Hierarchy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkState {
    pub all_selected: bool,
    pub some_selected: bool,
    pub selected_count: usize,
}

/// Read-only view of one selection against one registry.
///
/// Selected keys the registry does not know are dropped up front, so a stale
/// selection left over from a refetch never leaks into the derivations.
pub struct SelectionSnapshot<'a> {
    registry: &'a IdentityRegistry,
    mode: SelectionMode,
    selected: Vec<&'a str>,
    set: HashSet<&'a str>,
}

impl<'a> SelectionSnapshot<'a> {
    pub fn new(registry: &'a IdentityRegistry, selected: &'a [String], mode: SelectionMode) -> Self {
        let selected: Vec<&'a str> = selected
            .iter()
            .map(String::as_str)
            .filter(|k| registry.contains(k))
            .collect();
        let set = selected.iter().copied().collect();
        Self {
            registry,
            mode,
            selected,
            set,
        }
    }

    fn lookup(&self) -> &dyn HierarchyLookup {
        match self.mode {
            SelectionMode::Flat => &NoHierarchy,
            SelectionMode::Hierarchy => self.registry,
        }
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.set.contains(key)
    }

    pub fn selected(&self) -> &[&'a str] {
        &self.selected
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn checkbox_state(&self, key: &str) -> CheckboxState {
        checkbox_state(|k| self.is_selected(k), key, self.lookup())
    }

    /// Checked keys not covered by an explicitly selected, checked parent.
    pub fn actionable_roots(&self) -> Vec<&'a str> {
        self.selected
            .iter()
            .copied()
            .filter(|key| self.checkbox_state(key).is_checked())
            .filter(|key| match self.lookup().parent_key(key) {
                Some(parent) => {
                    !(self.is_selected(parent) && self.checkbox_state(parent).is_checked())
                }
                None => true,
            })
            .collect()
    }

    /// The one kind shared by every actionable root.
    pub fn selected_kind(&self) -> Option<&'a str> {
        single_kind(self.actionable_roots().into_iter().map(kind_of))
    }

    pub fn is_same_kind(&self) -> bool {
        self.selected_kind().is_some()
    }

    pub fn all_roots_are_checked(&self) -> bool {
        !self.actionable_roots().is_empty()
    }

    pub fn can_perform_action(&self) -> bool {
        let roots = self.actionable_roots();
        !roots.is_empty() && single_kind(roots.into_iter().map(kind_of)).is_some()
    }

    /// Header checkbox state over the visible rows.
    pub fn bulk_state(&self) -> BulkState {
        let selectable = self.registry.all_keys();
        if selectable.is_empty() || self.selected.is_empty() {
            return BulkState::default();
        }
        let selected_count = selectable.iter().filter(|k| self.is_selected(k)).count();
        let all_selected = selected_count == selectable.len();
        BulkState {
            all_selected,
            some_selected: selected_count > 0 && !all_selected,
            selected_count,
        }
    }
}

fn single_kind<'k>(mut kinds: impl Iterator<Item = &'k str>) -> Option<&'k str> {
    let first = kinds.next()?;
    kinds.all(|k| k == first).then_some(first)
}

/// Kind of the structural roots of `selected`: keys whose parent key (derived
/// from the key itself) is not also selected. Needs no registry.
pub fn actionable_kind<'k>(selected: &'k [String], schema: &KeySchema) -> Option<&'k str> {
    let set: HashSet<&str> = selected.iter().map(String::as_str).collect();
    let roots = selected.iter().filter(|key| {
        schema
            .parent_key_of(key)
            .is_none_or(|parent| !set.contains(parent.as_str()))
    });
    single_kind(roots.map(|k| kind_of(k)))
}

/// Anchor plus mode; every mutation goes through a [`SelectionStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionModel {
    anchor: Option<String>,
    mode: SelectionMode,
}

impl SelectionModel {
    pub fn new(mode: SelectionMode) -> Self {
        Self { anchor: None, mode }
    }

    pub fn flat() -> Self {
        Self::new(SelectionMode::Flat)
    }

    pub fn hierarchy() -> Self {
        Self::new(SelectionMode::Hierarchy)
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    pub fn clear_anchor(&mut self) {
        self.anchor = None;
    }

    pub fn snapshot<'a>(
        &self,
        registry: &'a IdentityRegistry,
        store: &'a impl SelectionStore,
    ) -> SelectionSnapshot<'a> {
        SelectionSnapshot::new(registry, store.selected_keys(), self.mode)
    }

    /// Plain toggle. The anchor moves only when the key becomes selected.
    pub fn on_toggle(&mut self, store: &mut impl SelectionStore, key: &str) {
        let selecting = !store.selected_keys().iter().any(|k| k == key);
        store.toggle(key);
        if selecting {
            self.anchor = Some(key.to_string());
        }
    }

    /// Master-switch toggle for parents, demoting toggle for leaves.
    pub fn on_toggle_with_hierarchy(
        &mut self,
        registry: &IdentityRegistry,
        store: &mut impl SelectionStore,
        key: &str,
    ) {
        let lookup: &dyn HierarchyLookup = match self.mode {
            SelectionMode::Flat => &NoHierarchy,
            SelectionMode::Hierarchy => registry,
        };
        let result = toggle_in_hierarchy(store.selected_keys(), key, lookup);
        debug!(key = %key, selected = result.selection.len(), "hierarchy toggle");
        if result.selection.is_empty() {
            store.clear();
        } else {
            store.select_many(result.selection);
        }
        if let AnchorUpdate::Set(anchor) = result.anchor {
            self.anchor = Some(anchor);
        }
    }

    /// Inclusive slice of the visual order between two keys, in either
    /// direction. Empty if either key is not visible.
    pub fn keys_between(registry: &IdentityRegistry, from: &str, to: &str) -> Vec<String> {
        let (Some(a), Some(b)) = (registry.index_of(from), registry.index_of(to)) else {
            return Vec::new();
        };
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        registry.all_keys()[start..=end].to_vec()
    }

    /// Extends the selection from the anchor to `target`.
    ///
    /// Returns the signed number of keys affected: positive when keys were
    /// added, negative when a fully selected range was cleared.
    pub fn range_select(
        &mut self,
        registry: &IdentityRegistry,
        store: &mut impl SelectionStore,
        target: &str,
    ) -> isize {
        let Some(anchor) = self.anchor.clone() else {
            if store.selected_keys().iter().any(|k| k == target) {
                return 0;
            }
            store.toggle(target);
            self.anchor = Some(target.to_string());
            return 1;
        };

        let range = Self::keys_between(registry, &anchor, target);
        if range.is_empty() {
            return 0;
        }

        let current: HashSet<&str> = store.selected_keys().iter().map(String::as_str).collect();
        if range.iter().all(|k| current.contains(k.as_str())) {
            let remove: HashSet<&str> = range.iter().map(String::as_str).collect();
            let remaining: Vec<String> = store
                .selected_keys()
                .iter()
                .filter(|k| !remove.contains(k.as_str()))
                .cloned()
                .collect();
            if remaining.is_empty() {
                store.clear();
            } else {
                store.select_many(remaining);
            }
            self.anchor = None;
            debug!(anchor = %anchor, target = %target, count = range.len(), "range deselected");
            return -(range.len() as isize);
        }

        let before = store.selected_keys().len();
        let mut next = store.selected_keys().to_vec();
        for key in range {
            if !current.contains(key.as_str()) {
                next.push(key);
            }
        }
        let added = next.len() - before;
        store.select_many(next);
        debug!(anchor = %anchor, target = %target, added, "range selected");
        added as isize
    }

    /// Header checkbox: clear when everything is selected, else select all
    /// visible keys.
    pub fn on_select_all(&mut self, registry: &IdentityRegistry, store: &mut impl SelectionStore) {
        let bulk = self.snapshot(registry, &*store).bulk_state();
        if bulk.all_selected {
            store.clear();
        } else {
            store.select_many(registry.all_keys().to_vec());
        }
    }

    /// Clears both the store and the anchor.
    pub fn clear(&mut self, store: &mut impl SelectionStore) {
        store.clear();
        self.anchor = None;
    }
}
