//! Drag eligibility, derived purely from selection state.
//!
//! Computed once per selection change. Both handle styling and the live
//! drag session read from the same snapshot; a session never re-derives it
//! mid-drag.

use crate::registry::IdentityRegistry;
use crate::selection::{CheckboxState, SelectionSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraggedEntity {
    pub key: String,
    pub entity_id: String,
    pub kind: String,
    pub parent_key: Option<String>,
    pub current_parent_id: Option<String>,
}

impl DraggedEntity {
    fn resolve(registry: &IdentityRegistry, key: &str) -> Option<Self> {
        let identity = registry.get(key)?;
        let parent_key = identity.parent_key.clone();
        let current_parent_id = parent_key
            .as_deref()
            .and_then(|p| registry.entity_id(p))
            .map(str::to_string);
        Some(Self {
            key: key.to_string(),
            entity_id: identity.entity_id.clone(),
            kind: identity.kind.clone(),
            parent_key,
            current_parent_id,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragEligibility {
    pub can_drag: bool,
    pub drag_kind: Option<String>,
    pub dragged_entities: Vec<DraggedEntity>,
    pub is_multi_drag: bool,
}

impl DragEligibility {
    pub fn ineligible() -> Self {
        Self::default()
    }

    fn from_entities(kind: &str, dragged_entities: Vec<DraggedEntity>) -> Self {
        if dragged_entities.is_empty() {
            return Self::ineligible();
        }
        Self {
            can_drag: true,
            drag_kind: Some(kind.to_string()),
            is_multi_drag: dragged_entities.len() > 1,
            dragged_entities,
        }
    }

    pub fn from_snapshot(snapshot: &SelectionSnapshot<'_>, registry: &IdentityRegistry) -> Self {
        let roots = snapshot.actionable_roots();
        let kind = snapshot.selected_kind();
        derive_eligibility(&roots, kind, kind.is_some(), registry)
    }

    pub fn drag_count(&self) -> usize {
        self.dragged_entities.len()
    }

    pub fn entity_ids(&self) -> Vec<String> {
        self.dragged_entities
            .iter()
            .map(|e| e.entity_id.clone())
            .collect()
    }

    pub fn contains_entity(&self, entity_id: &str) -> bool {
        self.dragged_entities.iter().any(|e| e.entity_id == entity_id)
    }
}

/// Eligibility from the actionable roots of a selection.
///
/// Unresolvable roots are skipped. Mixed kinds, no roots, or nothing
/// resolvable all yield [`DragEligibility::ineligible`].
pub fn derive_eligibility<K: AsRef<str>>(
    roots: &[K],
    selected_kind: Option<&str>,
    is_same_kind: bool,
    registry: &IdentityRegistry,
) -> DragEligibility {
    if roots.is_empty() {
        return DragEligibility::ineligible();
    }
    let Some(kind) = selected_kind.filter(|_| is_same_kind) else {
        return DragEligibility::ineligible();
    };
    let entities = roots
        .iter()
        .filter_map(|key| DraggedEntity::resolve(registry, key.as_ref()))
        .collect();
    DragEligibility::from_entities(kind, entities)
}

/// Eligibility for a gesture that starts on `start_key`.
///
/// Starting on a row already in `eligibility` drags that snapshot as is.
/// Starting anywhere else drags only that row, leaving the selection
/// untouched.
pub fn draggable_entities(
    eligibility: &DragEligibility,
    registry: &IdentityRegistry,
    start_key: &str,
) -> DragEligibility {
    if eligibility.dragged_entities.iter().any(|e| e.key == start_key) {
        return eligibility.clone();
    }
    match DraggedEntity::resolve(registry, start_key) {
        Some(entity) => {
            let kind = entity.kind.clone();
            DragEligibility::from_entities(&kind, vec![entity])
        }
        None => DragEligibility::ineligible(),
    }
}

/// Handle is live when a drag can start and this row is fully checked.
pub fn is_drag_handle_enabled(eligibility: &DragEligibility, state: CheckboxState) -> bool {
    eligibility.can_drag && state == CheckboxState::Checked
}

/// Handles of rows with any selection stay visible without hover.
pub fn is_drag_handle_always_visible(state: CheckboxState) -> bool {
    matches!(state, CheckboxState::Checked | CheckboxState::Indeterminate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::AllExpanded;
    use crate::registry::{MenuCategory, MenuLabel, MenuTree};

    fn registry() -> IdentityRegistry {
        MenuTree::new(vec![
            MenuLabel::new("L1", 0).with_categories(vec![
                MenuCategory::new("C1", 0),
                MenuCategory::new("C2", 1),
            ]),
            MenuLabel::new("L2", 1),
        ])
        .rows(&AllExpanded)
        .1
    }

    #[test]
    fn empty_roots_are_ineligible() {
        let e = derive_eligibility::<&str>(&[], Some("label"), true, &registry());
        assert!(!e.can_drag);
        assert_eq!(e.drag_count(), 0);
    }

    #[test]
    fn mixed_kinds_are_ineligible() {
        let e = derive_eligibility(&["label:L1", "category:L1~C1"], None, false, &registry());
        assert_eq!(e, DragEligibility::ineligible());
    }

    #[test]
    fn unresolvable_roots_are_skipped() {
        let registry = registry();
        let e = derive_eligibility(
            &["category:L1~C2", "category:gone~X", "category:L1~C1"],
            Some("category"),
            true,
            &registry,
        );
        assert!(e.can_drag);
        assert!(e.is_multi_drag);
        assert_eq!(e.entity_ids(), ["C2", "C1"]);
        assert_eq!(e.dragged_entities[0].current_parent_id.as_deref(), Some("L1"));
        assert_eq!(e.dragged_entities[0].parent_key.as_deref(), Some("label:L1"));

        let none = derive_eligibility(&["category:gone~X"], Some("category"), true, &registry);
        assert!(!none.can_drag);
    }

    #[test]
    fn gesture_outside_selection_drags_single_row() {
        let registry = registry();
        let selected =
            derive_eligibility(&["category:L1~C1", "category:L1~C2"], Some("category"), true, &registry);
        let e = draggable_entities(&selected, &registry, "label:L2");
        assert_eq!(e.drag_kind.as_deref(), Some("label"));
        assert_eq!(e.entity_ids(), ["L2"]);
        assert!(!e.is_multi_drag);

        let e = draggable_entities(&selected, &registry, "category:L1~C2");
        assert_eq!(e, selected);

        let e = draggable_entities(&selected, &registry, "label:missing");
        assert!(!e.can_drag);
    }

    #[test]
    fn gesture_on_selection_reuses_the_snapshot() {
        let selected = derive_eligibility(&["label:L1", "label:L2"], Some("label"), true, &registry());
        // Nothing resolves here, so a fresh derivation would come back empty.
        let e = draggable_entities(&selected, &IdentityRegistry::default(), "label:L2");
        assert_eq!(e, selected);
        assert_eq!(e.entity_ids(), ["L1", "L2"]);
    }

    #[test]
    fn handle_states() {
        let eligible = derive_eligibility(&["label:L1"], Some("label"), true, &registry());
        assert!(is_drag_handle_enabled(&eligible, CheckboxState::Checked));
        assert!(!is_drag_handle_enabled(&eligible, CheckboxState::Indeterminate));
        assert!(!is_drag_handle_enabled(
            &DragEligibility::ineligible(),
            CheckboxState::Checked
        ));
        assert!(is_drag_handle_always_visible(CheckboxState::Indeterminate));
        assert!(!is_drag_handle_always_visible(CheckboxState::Unchecked));
    }
}
