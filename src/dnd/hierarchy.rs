//! Drag engine for the two-level menu: labels that hold categories.
//!
//! Wraps [`GroupedReorder`] for the session and hover throttle, and adds
//! drop classification, hover auto-expand, and cross-parent moves. The core
//! is fed entity ids; rows are resolved to entity ids through the registry.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::actions::HistoryLabel;
use crate::config::DndConfig;
use crate::expand::ExpandState;
use crate::history::UndoHistory;
use crate::persistence::{MenuPersistence, PersistResult};
use crate::registry::key::{CATEGORY_KIND, LABEL_KIND, create_key};
use crate::registry::IdentityRegistry;

use super::eligibility::{DragEligibility, draggable_entities};
use super::grouped::{DragClasses, GroupedReorder};
use super::moves::{
    BatchMove, ReorderScope, SiblingReorder, execute_batch_move, execute_reorder,
};
use super::DropPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DropType {
    #[default]
    Reorder,
    Move,
}

/// A dragged child and the parent it was under when the drag started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraggedChild {
    pub child_id: String,
    pub from_parent_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    NoOp,
    Reordered {
        order: Vec<String>,
    },
    Moved {
        parent_id: String,
        order: Vec<String>,
        /// Selection keys of the moved children under their new parent.
        rekeyed: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuDragClasses {
    pub is_dragging: bool,
    pub is_in_drag_set: bool,
    pub is_drag_over: bool,
    pub drop_position: Option<DropPosition>,
    pub drop_type: Option<DropType>,
    pub is_auto_expanded: bool,
}

/// Classifies a drop of `dragged_ids` (all of `drag_kind`) onto `target_key`.
///
/// `None` means the drop is invalid: no drag kind, an unresolvable target,
/// a target inside the dragged set, a target that cannot hold the dragged
/// kind, or children dropped back onto the parent they all came from.
pub fn drop_info(
    registry: &IdentityRegistry,
    target_key: &str,
    drag_kind: Option<&str>,
    dragged_ids: &[String],
    dragged_children: &[DraggedChild],
) -> Option<DropType> {
    let drag_kind = drag_kind?;
    let target = registry.get(target_key)?;
    if dragged_ids.iter().any(|id| *id == target.entity_id) {
        return None;
    }

    if target.kind == drag_kind {
        if target.depth == 0 {
            return Some(DropType::Reorder);
        }
        let target_parent = target
            .parent_key
            .as_deref()
            .and_then(|p| registry.entity_id(p));
        let same_parent = dragged_children
            .iter()
            .all(|c| Some(c.from_parent_id.as_str()) == target_parent);
        return Some(if same_parent {
            DropType::Reorder
        } else {
            DropType::Move
        });
    }

    if target.can_receive(drag_kind) {
        if dragged_children
            .iter()
            .all(|c| c.from_parent_id == target.entity_id)
        {
            return None;
        }
        return Some(DropType::Move);
    }
    None
}

/// The parent whose subtree the pointer is in. A root row owns itself.
fn territory_owner(registry: &IdentityRegistry, key: &str) -> Option<String> {
    let identity = registry.get(key)?;
    match identity.parent_key.as_deref() {
        None => Some(identity.entity_id.clone()),
        Some(parent) => registry.entity_id(parent).map(str::to_string),
    }
}

/// Sort key matching on-screen order. Rows hidden under a collapsed parent
/// sort right after that parent, in child order.
fn visual_rank(registry: &IdentityRegistry, key: &str) -> (usize, usize) {
    if let Some(index) = registry.index_of(key) {
        return (index, 0);
    }
    let Some(parent) = registry.parent_key(key) else {
        return (usize::MAX, 0);
    };
    let slot = registry
        .direct_child_keys(parent)
        .iter()
        .position(|k| *k == key)
        .map_or(usize::MAX, |p| p + 1);
    (registry.index_of(parent).unwrap_or(usize::MAX), slot)
}

struct MenuDrag {
    drag_kind: String,
    dragged_children: Vec<DraggedChild>,
}

enum MenuDropPlan {
    Reorder(SiblingReorder),
    Move(BatchMove),
}

pub struct HierarchicalDnd {
    core: GroupedReorder,
    config: DndConfig,
    parent_kind: String,
    child_kind: String,
    eligibility: DragEligibility,
    drag: Option<MenuDrag>,
    /// Type of the committed hover target.
    drop_type: DropType,
    /// Type of the newest hover sample, committed with it.
    offered_type: Option<DropType>,
    auto_expanded: Option<String>,
    pending_expand: Option<(String, Instant)>,
    flash: Option<(String, Instant)>,
    on_selection_update: Option<Box<dyn FnMut(Vec<String>)>>,
}

impl HierarchicalDnd {
    pub fn new(config: &DndConfig) -> Self {
        Self {
            core: GroupedReorder::new(config),
            config: *config,
            parent_kind: LABEL_KIND.to_string(),
            child_kind: CATEGORY_KIND.to_string(),
            eligibility: DragEligibility::ineligible(),
            drag: None,
            drop_type: DropType::Reorder,
            offered_type: None,
            auto_expanded: None,
            pending_expand: None,
            flash: None,
            on_selection_update: None,
        }
    }

    pub fn with_kinds(mut self, parent_kind: &str, child_kind: &str) -> Self {
        self.parent_kind = parent_kind.to_string();
        self.child_kind = child_kind.to_string();
        self
    }

    /// Receives the new selection keys after children change parent.
    pub fn with_on_selection_update(mut self, callback: impl FnMut(Vec<String>) + 'static) -> Self {
        self.on_selection_update = Some(Box::new(callback));
        self
    }

    /// Eligibility derived from the current selection.
    pub fn set_eligibility(&mut self, eligibility: DragEligibility) {
        self.core.set_eligibility(eligibility.clone());
        self.eligibility = eligibility;
    }

    pub fn eligibility(&self) -> &DragEligibility {
        &self.eligibility
    }

    pub fn is_dragging(&self) -> bool {
        self.core.is_dragging()
    }

    pub fn is_dropping(&self) -> bool {
        self.core.is_dropping()
    }

    pub fn drag_count(&self) -> usize {
        self.core.drag_count()
    }

    pub fn is_multi_drag(&self) -> bool {
        self.core.is_multi_drag()
    }

    pub fn drop_type(&self) -> DropType {
        self.drop_type
    }

    pub fn auto_expanded(&self) -> Option<&str> {
        self.auto_expanded.as_deref()
    }

    pub fn pending_expand(&self) -> Option<&str> {
        self.pending_expand.as_ref().map(|(id, _)| id.as_str())
    }

    pub fn dragged_children(&self) -> &[DraggedChild] {
        self.drag.as_ref().map_or(&[], |d| d.dragged_children.as_slice())
    }

    pub fn is_draggable(&self, registry: &IdentityRegistry, key: &str) -> Option<bool> {
        let entity = registry.entity_id(key)?;
        self.core.is_draggable(entity)
    }

    /// Starts a drag on the row `key`.
    ///
    /// A row outside the actionable selection drags alone. Dragged children
    /// and their source parents are frozen here, in on-screen order.
    pub fn drag_start(&mut self, registry: &IdentityRegistry, key: &str) -> bool {
        let Some(entity_id) = registry.entity_id(key) else {
            return false;
        };
        let effective = draggable_entities(&self.eligibility, registry, key);
        let Some(drag_kind) = effective.drag_kind.clone() else {
            return false;
        };

        self.core.set_eligibility(effective.clone());
        let started = self.core.drag_start(entity_id);
        self.core.set_eligibility(self.eligibility.clone());
        if !started {
            return false;
        }

        let mut children: Vec<_> = effective
            .dragged_entities
            .iter()
            .filter(|e| e.kind == self.child_kind)
            .filter_map(|e| {
                let parent = e.current_parent_id.clone()?;
                Some((visual_rank(registry, &e.key), DraggedChild {
                    child_id: e.entity_id.clone(),
                    from_parent_id: parent,
                }))
            })
            .collect();
        children.sort_by_key(|(rank, _)| *rank);

        self.pending_expand = None;
        self.drop_type = DropType::Reorder;
        self.offered_type = None;
        self.drag = Some(MenuDrag {
            drag_kind,
            dragged_children: children.into_iter().map(|(_, c)| c).collect(),
        });
        true
    }

    fn classify(&self, registry: &IdentityRegistry, target_key: &str) -> Option<DropType> {
        let drag = self.drag.as_ref()?;
        let session = self.core.session()?;
        drop_info(
            registry,
            target_key,
            Some(&drag.drag_kind),
            &session.dragged_ids,
            &drag.dragged_children,
        )
    }

    /// Pointer over the row `target_key`, on the `position` side of it.
    ///
    /// Leaving a parent's territory collapses whatever the drag auto-expanded
    /// there. Hovering a collapsed parent that accepts the dragged kind arms
    /// its expand timer.
    pub fn drag_over(
        &mut self,
        registry: &IdentityRegistry,
        expand: &mut dyn ExpandState,
        target_key: &str,
        position: DropPosition,
        now: Instant,
    ) {
        let Some(drag_kind) = self.drag.as_ref().map(|d| d.drag_kind.clone()) else {
            return;
        };
        let Some(target) = registry.get(target_key) else {
            return;
        };
        let owner = territory_owner(registry, target_key);

        if let Some(current) = &self.auto_expanded
            && owner.as_ref() != Some(current)
        {
            debug!(parent = %current, "collapse auto-expanded parent");
            expand.collapse(current);
            self.auto_expanded = None;
        }
        if let Some((pending, _)) = &self.pending_expand
            && owner.as_ref() != Some(pending)
        {
            self.pending_expand = None;
        }

        let collapsed_receiver = target.is_expandable
            && target.can_receive(&drag_kind)
            && !expand.is_expanded(&target.entity_id);
        let already_armed = self
            .pending_expand
            .as_ref()
            .is_some_and(|(id, _)| *id == target.entity_id);
        if collapsed_receiver && !already_armed {
            self.pending_expand = Some((
                target.entity_id.clone(),
                now + self.config.auto_expand_delay(),
            ));
        }

        let entity_id = target.entity_id.clone();
        match self.classify(registry, target_key) {
            Some(drop_type) => {
                self.offered_type = Some(drop_type);
                if self.core.drag_over(&entity_id, position, now) {
                    self.drop_type = drop_type;
                }
            }
            None => {
                self.offered_type = None;
                self.drop_type = DropType::Reorder;
                self.core.clear_hover();
            }
        }
    }

    /// Advances the hover throttle and the expand and flash timers.
    pub fn tick(&mut self, now: Instant, expand: &mut dyn ExpandState) {
        if self.core.tick(now)
            && let Some(drop_type) = self.offered_type
        {
            self.drop_type = drop_type;
        }
        if let Some((id, due)) = &self.pending_expand
            && now >= *due
        {
            let id = id.clone();
            self.pending_expand = None;
            if !expand.is_expanded(&id) {
                debug!(parent = %id, "auto-expand");
                expand.expand(&id);
                self.flash = Some((id.clone(), now + self.config.auto_expanded_flash()));
                self.auto_expanded = Some(id);
            }
        }
        if self.flash.as_ref().is_some_and(|(_, until)| now >= *until) {
            self.flash = None;
        }
    }

    fn plan(
        &self,
        registry: &IdentityRegistry,
        target_key: &str,
        drop_type: DropType,
        dragged: Vec<String>,
        position: DropPosition,
    ) -> Option<MenuDropPlan> {
        let drag = self.drag.as_ref()?;
        let target = registry.get(target_key)?;
        match drop_type {
            DropType::Reorder => {
                let count = dragged.len();
                let (scope, siblings, label) = match target.parent_key.as_deref() {
                    None => (
                        ReorderScope::Roots,
                        registry.root_entity_ids(&target.kind),
                        HistoryLabel::reorder(&drag.drag_kind, count, None),
                    ),
                    Some(parent_key) => {
                        let parent = registry.get(parent_key)?;
                        (
                            ReorderScope::Children(parent.entity_id.clone()),
                            registry.child_entity_ids(parent_key),
                            HistoryLabel::reorder(&drag.drag_kind, count, Some(&parent.kind)),
                        )
                    }
                };
                Some(MenuDropPlan::Reorder(SiblingReorder {
                    scope,
                    siblings,
                    dragged_ids: dragged,
                    target_id: target.entity_id.clone(),
                    position,
                    label,
                }))
            }
            DropType::Move => {
                let (parent_key, target_child_id) = if target.kind == self.parent_kind {
                    (target.key.as_str(), None)
                } else {
                    (target.parent_key.as_deref()?, Some(target.entity_id.clone()))
                };
                let to_parent_id = registry.entity_id(parent_key)?.to_string();
                let mut source_orders: Vec<(String, Vec<String>)> = Vec::new();
                for child in &drag.dragged_children {
                    if child.from_parent_id == to_parent_id
                        || source_orders.iter().any(|(id, _)| *id == child.from_parent_id)
                    {
                        continue;
                    }
                    if let Some(source_key) = registry.key_for(&self.parent_kind, &child.from_parent_id) {
                        source_orders.push((
                            child.from_parent_id.clone(),
                            registry.child_entity_ids(source_key),
                        ));
                    }
                }
                Some(MenuDropPlan::Move(BatchMove {
                    moves: drag.dragged_children.clone(),
                    to_parent_id,
                    target_child_id,
                    position,
                    existing: registry.child_entity_ids(parent_key),
                    source_orders,
                    child_kind: self.child_kind.clone(),
                    parent_kind: self.parent_kind.clone(),
                }))
            }
        }
    }

    /// Drops onto `target_key` and persists the result.
    ///
    /// An invalid target ends the drag as if it had been cancelled. The
    /// session is cleared whether persistence succeeds or fails, and errors
    /// are returned to the caller.
    pub async fn drop_on(
        &mut self,
        registry: &IdentityRegistry,
        expand: &mut dyn ExpandState,
        target_key: &str,
        persistence: Arc<dyn MenuPersistence>,
        history: Option<&mut UndoHistory>,
    ) -> PersistResult<DropOutcome> {
        let Some(drop_type) = self.classify(registry, target_key) else {
            debug!(target = %target_key, "invalid drop target");
            self.clear(false, expand);
            return Ok(DropOutcome::NoOp);
        };
        let Some(entity_id) = registry.entity_id(target_key) else {
            self.clear(false, expand);
            return Ok(DropOutcome::NoOp);
        };
        let Some(core_plan) = self.core.begin_drop(entity_id) else {
            self.clear(false, expand);
            return Ok(DropOutcome::NoOp);
        };
        let Some(plan) = self.plan(
            registry,
            target_key,
            drop_type,
            core_plan.dragged_ids,
            core_plan.position,
        ) else {
            self.clear(false, expand);
            return Ok(DropOutcome::NoOp);
        };

        let result = match plan {
            MenuDropPlan::Reorder(request) => execute_reorder(&persistence, history, request)
                .await
                .map(|order| DropOutcome::Reordered { order }),
            MenuDropPlan::Move(request) => {
                let moves = request.moves.clone();
                let parent_id = request.to_parent_id.clone();
                execute_batch_move(&persistence, history, request)
                    .await
                    .map(|result| {
                        let rekeyed = if result.crossed.is_empty() {
                            Vec::new()
                        } else {
                            moves
                                .iter()
                                .map(|m| create_key(&self.child_kind, [&parent_id, &m.child_id]))
                                .collect()
                        };
                        DropOutcome::Moved {
                            parent_id,
                            order: result.order,
                            rekeyed,
                        }
                    })
            }
        };

        match &result {
            Ok(DropOutcome::Moved { parent_id, rekeyed, .. }) => {
                if !rekeyed.is_empty()
                    && let Some(callback) = self.on_selection_update.as_mut()
                {
                    callback(rekeyed.clone());
                }
                if !expand.is_expanded(parent_id) {
                    expand.expand(parent_id);
                }
            }
            Ok(_) => {}
            Err(error) => warn!(%error, target = %target_key, "menu drop failed"),
        }
        self.clear(true, expand);
        result
    }

    /// Drag ended without a drop. Deferred while a drop is in flight.
    pub fn drag_end(&mut self, expand: &mut dyn ExpandState) {
        if self.core.is_dropping() {
            return;
        }
        self.clear(false, expand);
    }

    /// Resets the session. A cancelled drag also collapses the parent it
    /// auto-expanded; a completed drop leaves it open.
    fn clear(&mut self, was_dropped: bool, expand: &mut dyn ExpandState) {
        self.pending_expand = None;
        if let Some(id) = self.auto_expanded.take()
            && !was_dropped
        {
            expand.collapse(&id);
        }
        self.drag = None;
        self.drop_type = DropType::Reorder;
        self.offered_type = None;
        self.core.clear();
    }

    pub fn drag_classes(&self, registry: &IdentityRegistry, key: &str) -> MenuDragClasses {
        let Some(entity_id) = registry.entity_id(key) else {
            return MenuDragClasses::default();
        };
        let DragClasses {
            is_dragging,
            is_in_drag_set,
            is_drag_over,
            drop_position,
        } = self.core.drag_classes(entity_id);
        let drop_type = self.classify(registry, key).filter(|_| is_drag_over);
        let is_drag_over = drop_type.is_some();
        MenuDragClasses {
            is_dragging,
            is_in_drag_set,
            is_drag_over,
            drop_position: drop_position.filter(|_| is_drag_over),
            drop_type,
            is_auto_expanded: self.flash.as_ref().is_some_and(|(id, _)| id == entity_id),
        }
    }
}
