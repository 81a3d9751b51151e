//! Drag session for a single sibling list.
//!
//! States: idle → dragging (after [`GroupedReorder::drag_start`]) → hover
//! updates (throttled) → dropping → idle. A session ends exactly once, by
//! drop or by drag end, and both are no-ops on an idle engine.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::actions::HistoryLabel;
use crate::config::DndConfig;
use crate::history::{UndoAction, UndoHistory};
use crate::persistence::{FlatReorder, PersistResult};

use super::eligibility::DragEligibility;
use super::reorder::reorder;
use super::throttle::Throttle;
use super::DropPosition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub primary_id: String,
    /// Frozen at drag start; later selection edits never reach it.
    pub dragged_ids: Vec<String>,
    pub drag_over_id: Option<String>,
    pub drop_position: DropPosition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Hover {
    Clear,
    Over {
        target: String,
        position: DropPosition,
    },
}

/// What a drop will do, captured when the drop begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropPlan {
    pub primary_id: String,
    pub dragged_ids: Vec<String>,
    pub target_id: String,
    pub position: DropPosition,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragClasses {
    pub is_dragging: bool,
    pub is_in_drag_set: bool,
    pub is_drag_over: bool,
    pub drop_position: Option<DropPosition>,
}

pub struct GroupedReorder {
    eligibility: DragEligibility,
    session: Option<DragSession>,
    throttle: Throttle<Hover>,
    dropping: bool,
    on_drop_complete: Option<Box<dyn FnMut()>>,
}

impl GroupedReorder {
    pub fn new(config: &DndConfig) -> Self {
        Self {
            eligibility: DragEligibility::ineligible(),
            session: None,
            throttle: Throttle::new(config.drag_over_throttle()),
            dropping: false,
            on_drop_complete: None,
        }
    }

    /// Called after every successful drop, e.g. to reset a column sort that
    /// would fight the manual order.
    pub fn with_on_drop_complete(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_drop_complete = Some(Box::new(callback));
        self
    }

    pub fn set_eligibility(&mut self, eligibility: DragEligibility) {
        self.eligibility = eligibility;
    }

    pub fn eligibility(&self) -> &DragEligibility {
        &self.eligibility
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_dropping(&self) -> bool {
        self.dropping
    }

    pub fn is_multi_drag(&self) -> bool {
        self.drag_count() > 1
    }

    pub fn drag_count(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.dragged_ids.len())
    }

    pub fn eligible_entity_ids(&self) -> Vec<String> {
        self.eligibility.entity_ids()
    }

    /// Starts a session on `item_id`. Returns false (and leaves the engine
    /// idle) when nothing is eligible or the item is not in the eligible set.
    pub fn drag_start(&mut self, item_id: &str) -> bool {
        if !self.eligibility.can_drag || !self.eligibility.contains_entity(item_id) {
            debug!(item = %item_id, "drag start rejected");
            return false;
        }
        let dragged_ids = self.eligibility.entity_ids();
        debug!(item = %item_id, count = dragged_ids.len(), "drag start");
        self.throttle.cancel();
        self.dropping = false;
        self.session = Some(DragSession {
            primary_id: item_id.to_string(),
            dragged_ids,
            drag_over_id: None,
            drop_position: DropPosition::Before,
        });
        true
    }

    /// Pointer over `target` on the given side of it.
    ///
    /// Returns true when the sample was committed now rather than held for
    /// the next [`tick`](Self::tick).
    pub fn drag_over(&mut self, target: &str, position: DropPosition, now: Instant) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        let sample = if session.dragged_ids.iter().any(|id| id == target) {
            Hover::Clear
        } else {
            Hover::Over {
                target: target.to_string(),
                position,
            }
        };
        match self.throttle.offer(sample, now) {
            Some(sample) => {
                self.apply_hover(sample);
                true
            }
            None => false,
        }
    }

    /// Commits a coalesced hover sample once the throttle interval passes.
    /// Returns true when one was committed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.throttle.poll(now) {
            Some(sample) => {
                self.apply_hover(sample);
                true
            }
            None => false,
        }
    }

    /// Clears the indicator right away, discarding any pending sample.
    pub fn clear_hover(&mut self) {
        self.throttle.take_pending();
        if let Some(session) = &mut self.session {
            session.drag_over_id = None;
        }
    }

    /// Leaving a row keeps the indicator where it is.
    pub fn drag_leave(&mut self) {}

    fn apply_hover(&mut self, hover: Hover) {
        let Some(session) = &mut self.session else {
            return;
        };
        match hover {
            Hover::Clear => session.drag_over_id = None,
            Hover::Over { target, position } => {
                session.drag_over_id = Some(target);
                session.drop_position = position;
            }
        }
    }

    /// Marks the drop as in flight and returns its plan, or ends the session
    /// when the drop is invalid (no session, nothing dragged, or `target` in
    /// the dragged set).
    pub fn begin_drop(&mut self, target: &str) -> Option<DropPlan> {
        if let Some(sample) = self.throttle.take_pending() {
            self.apply_hover(sample);
        }
        let session = self.session.as_ref()?;
        if session.dragged_ids.is_empty() || session.dragged_ids.iter().any(|id| id == target) {
            debug!(target = %target, "drop ignored");
            self.clear();
            return None;
        }
        let plan = DropPlan {
            primary_id: session.primary_id.clone(),
            dragged_ids: session.dragged_ids.clone(),
            target_id: target.to_string(),
            position: session.drop_position,
        };
        self.dropping = true;
        Some(plan)
    }

    /// Ends an in-flight drop, whatever its outcome.
    pub fn finish_drop(&mut self) {
        self.clear();
    }

    /// Drag ended without a drop. Deferred while a drop is in flight.
    pub fn drag_end(&mut self) {
        if self.dropping {
            debug!("drag end deferred to in-flight drop");
            return;
        }
        self.clear();
    }

    pub fn clear(&mut self) {
        self.session = None;
        self.throttle.cancel();
        self.dropping = false;
    }

    /// Drops onto `target`, persisting the new order of `items`.
    ///
    /// Returns `Ok(None)` when the drop was a no-op. The session is cleared
    /// whether persistence succeeds or fails; the completion callback and
    /// the undo entry only follow a success.
    pub async fn drop_on(
        &mut self,
        target: &str,
        items: &[String],
        persistence: Arc<dyn FlatReorder>,
        history: Option<&mut UndoHistory>,
    ) -> PersistResult<Option<Vec<String>>> {
        let Some(plan) = self.begin_drop(target) else {
            return Ok(None);
        };
        let prior = items.to_vec();
        let next = reorder(items, &plan.dragged_ids, &plan.target_id, plan.position);
        debug!(target = %target, position = %plan.position, count = plan.dragged_ids.len(), "drop");

        let result = persistence.reorder(next.clone()).await;
        self.finish_drop();
        if let Err(error) = result {
            warn!(%error, "reorder failed");
            return Err(error);
        }

        if let Some(history) = history {
            let kind = self.eligibility.drag_kind.clone().unwrap_or_default();
            let label = HistoryLabel::reorder(&kind, plan.dragged_ids.len(), None);
            history.push(flat_undo(label, persistence, prior, next.clone()));
        }
        if let Some(callback) = self.on_drop_complete.as_mut() {
            callback();
        }
        Ok(Some(next))
    }

    pub fn drag_classes(&self, item_id: &str) -> DragClasses {
        let Some(session) = &self.session else {
            return DragClasses::default();
        };
        let is_in_drag_set = session.dragged_ids.iter().any(|id| id == item_id);
        let is_drag_over = session.drag_over_id.as_deref() == Some(item_id) && !is_in_drag_set;
        DragClasses {
            is_dragging: session.primary_id == item_id,
            is_in_drag_set,
            is_drag_over,
            drop_position: is_drag_over.then_some(session.drop_position),
        }
    }

    /// `None` when nothing can be dragged at all, otherwise whether this
    /// item may start a drag.
    pub fn is_draggable(&self, item_id: &str) -> Option<bool> {
        self.eligibility
            .can_drag
            .then(|| self.eligibility.contains_entity(item_id))
    }
}

fn flat_undo(
    label: HistoryLabel,
    persistence: Arc<dyn FlatReorder>,
    prior: Vec<String>,
    next: Vec<String>,
) -> UndoAction {
    let redo_store = persistence.clone();
    UndoAction::new(
        label,
        move || {
            let store = persistence.clone();
            let ids = prior.clone();
            async move { store.reorder(ids).await }
        },
        move || {
            let store = redo_store.clone();
            let ids = next.clone();
            async move { store.reorder(ids).await }
        },
    )
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    use ratatui::layout::{Position, Rect};

    use super::*;
    use crate::dnd::eligibility::derive_eligibility;
    use crate::persistence::{MemoryMenuStore, PersistError};
    use crate::registry::{IdentityRegistry, LABEL_KIND, MenuLabel, MenuTree};

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn engine(selected: &[&str]) -> GroupedReorder {
        let registry = IdentityRegistry::flat(LABEL_KIND, ["A", "B", "C", "D"]);
        let roots: Vec<String> = selected.iter().map(|id| format!("label:{id}")).collect();
        let mut engine = GroupedReorder::new(&DndConfig::default());
        engine.set_eligibility(derive_eligibility(&roots, Some(LABEL_KIND), true, &registry));
        engine
    }

    fn store() -> Arc<MemoryMenuStore> {
        Arc::new(MemoryMenuStore::new(MenuTree::new(
            ["A", "B", "C", "D"]
                .iter()
                .enumerate()
                .map(|(i, id)| MenuLabel::new(*id, i as i64))
                .collect(),
        )))
    }

    #[test]
    fn drag_start_requires_eligible_item() {
        let mut pair = engine(&["C", "D"]);
        assert!(!pair.drag_start("A"));
        assert!(!pair.is_dragging());
        assert!(pair.drag_start("D"));
        assert_eq!(pair.drag_count(), 2);
        assert!(pair.is_multi_drag());

        let mut idle = engine(&[]);
        assert!(!idle.drag_start("A"));
        assert_eq!(idle.is_draggable("A"), None);
        assert_eq!(pair.is_draggable("A"), Some(false));
    }

    #[test]
    fn session_ignores_later_eligibility_changes() {
        let mut engine = engine(&["C"]);
        engine.drag_start("C");
        engine.set_eligibility(DragEligibility::ineligible());
        assert_eq!(engine.session().unwrap().dragged_ids, ["C"]);
    }

    #[test]
    fn hover_is_throttled_latest_wins() {
        let mut engine = engine(&["C"]);
        engine.drag_start("C");
        let t0 = Instant::now();
        assert!(engine.drag_over("A", DropPosition::Before, t0));
        assert_eq!(engine.session().unwrap().drag_over_id.as_deref(), Some("A"));

        assert!(!engine.drag_over("B", DropPosition::Before, t0 + Duration::from_millis(10)));
        assert!(!engine.drag_over("B", DropPosition::After, t0 + Duration::from_millis(20)));
        assert_eq!(engine.session().unwrap().drag_over_id.as_deref(), Some("A"));

        assert!(engine.tick(t0 + Duration::from_millis(60)));
        assert!(!engine.tick(t0 + Duration::from_millis(200)));
        let classes = engine.drag_classes("B");
        assert!(classes.is_drag_over);
        assert_eq!(classes.drop_position, Some(DropPosition::After));
    }

    #[test]
    fn hovering_dragged_item_clears_indicator() {
        let mut engine = engine(&["C"]);
        engine.drag_start("C");
        let t0 = Instant::now();
        engine.drag_over("A", DropPosition::Before, t0);
        engine.drag_over("C", DropPosition::After, t0 + Duration::from_millis(100));
        assert_eq!(engine.session().unwrap().drag_over_id, None);
        let classes = engine.drag_classes("C");
        assert!(classes.is_dragging && classes.is_in_drag_set && !classes.is_drag_over);
    }

    #[test]
    fn drag_end_defers_while_dropping() {
        let mut engine = engine(&["C"]);
        engine.drag_start("C");
        assert!(engine.begin_drop("A").is_some());
        engine.drag_end();
        assert!(engine.is_dragging());
        engine.finish_drop();
        assert!(!engine.is_dragging());
        engine.drag_end();
        assert!(!engine.is_dragging());
    }

    #[test]
    fn drop_on_dragged_item_ends_session() {
        let mut engine = engine(&["C"]);
        engine.drag_start("C");
        assert!(engine.begin_drop("C").is_none());
        assert!(!engine.is_dragging());
        assert!(engine.begin_drop("A").is_none());
    }

    #[tokio::test]
    async fn drop_persists_and_records_undo() {
        let store = store();
        let completed = Rc::new(Cell::new(0));
        let counter = completed.clone();
        let mut engine = engine(&["C", "D"]).with_on_drop_complete(move || counter.set(counter.get() + 1));
        let mut history = UndoHistory::default();

        engine.drag_start("C");
        engine.drag_over("A", DropPosition::Before, Instant::now());
        let order = engine
            .drop_on("A", &ids(&["A", "B", "C", "D"]), store.clone(), Some(&mut history))
            .await
            .unwrap();
        assert_eq!(order, Some(ids(&["C", "D", "A", "B"])));
        assert_eq!(store.tree().label_order(), ["C", "D", "A", "B"]);
        assert_eq!(completed.get(), 1);
        assert!(!engine.is_dragging());
        assert_eq!(history.undo_labels(), ["reorder:2-labels"]);

        history.undo().await.unwrap();
        assert_eq!(store.tree().label_order(), ["A", "B", "C", "D"]);
        history.redo().await.unwrap();
        assert_eq!(store.tree().label_order(), ["C", "D", "A", "B"]);
    }

    #[tokio::test]
    async fn one_row_targets_accept_a_drop_after_the_last_item() {
        let store = store();
        let mut engine = engine(&["A"]);
        let last_row = Rect::new(0, 7, 40, 1);

        engine.drag_start("A");
        let right_half = DropPosition::from_pointer(Position::new(30, 7), last_row);
        engine.drag_over("D", right_half, Instant::now());
        assert_eq!(engine.drag_classes("D").drop_position, Some(DropPosition::After));
        let order = engine
            .drop_on("D", &ids(&["A", "B", "C", "D"]), store.clone(), None)
            .await
            .unwrap();
        assert_eq!(order, Some(ids(&["B", "C", "D", "A"])));
        assert_eq!(store.tree().label_order(), ["B", "C", "D", "A"]);
    }

    #[tokio::test]
    async fn failed_drop_clears_session_and_propagates() {
        let store = store();
        store.fail_next(PersistError::Rejected("locked".into()));
        let completed = Rc::new(Cell::new(0));
        let counter = completed.clone();
        let mut engine = engine(&["B"]).with_on_drop_complete(move || counter.set(counter.get() + 1));
        let mut history = UndoHistory::default();

        engine.drag_start("B");
        let err = engine
            .drop_on("D", &ids(&["A", "B", "C", "D"]), store.clone(), Some(&mut history))
            .await
            .unwrap_err();
        assert_eq!(err, PersistError::Rejected("locked".into()));
        assert!(!engine.is_dragging());
        assert_eq!(completed.get(), 0);
        assert!(!history.can_undo());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn drop_without_session_is_a_no_op() {
        let store = store();
        let mut engine = engine(&["B"]);
        let result = engine
            .drop_on("A", &ids(&["A", "B"]), store.clone(), None)
            .await
            .unwrap();
        assert_eq!(result, None);
        assert!(store.calls().is_empty());
    }
}
