//! Persisted execution of same-parent reorders and batch cross-parent moves.
//!
//! Both push an undo entry that replays exact captured orders rather than
//! recomputing anything at undo time.

use std::sync::Arc;

use tracing::debug;

use crate::actions::HistoryLabel;
use crate::history::{UndoAction, UndoHistory};
use crate::persistence::{MenuPersistence, PersistResult};

use super::hierarchy::DraggedChild;
use super::reorder::reorder;
use super::DropPosition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderScope {
    Roots,
    Children(String),
}

async fn persist_order(
    persistence: &dyn MenuPersistence,
    scope: &ReorderScope,
    ids: Vec<String>,
) -> PersistResult<()> {
    match scope {
        ReorderScope::Roots => persistence.reorder_roots(ids).await,
        ReorderScope::Children(parent_id) => {
            persistence.reorder_children(parent_id.clone(), ids).await
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingReorder {
    pub scope: ReorderScope,
    /// Full sibling order before the drop.
    pub siblings: Vec<String>,
    pub dragged_ids: Vec<String>,
    pub target_id: String,
    pub position: DropPosition,
    pub label: HistoryLabel,
}

/// Reorders one sibling list and returns the persisted order.
pub async fn execute_reorder(
    persistence: &Arc<dyn MenuPersistence>,
    history: Option<&mut UndoHistory>,
    request: SiblingReorder,
) -> PersistResult<Vec<String>> {
    let SiblingReorder {
        scope,
        siblings,
        dragged_ids,
        target_id,
        position,
        label,
    } = request;
    let next = reorder(&siblings, &dragged_ids, &target_id, position);
    debug!(?scope, count = dragged_ids.len(), "persist sibling reorder");
    persist_order(persistence.as_ref(), &scope, next.clone()).await?;

    if let Some(history) = history {
        let undo_store = persistence.clone();
        let redo_store = persistence.clone();
        let undo_scope = scope.clone();
        let redo_scope = scope;
        let redo_order = next.clone();
        history.push(UndoAction::new(
            label,
            move || {
                let store = undo_store.clone();
                let scope = undo_scope.clone();
                let ids = siblings.clone();
                async move { persist_order(store.as_ref(), &scope, ids).await }
            },
            move || {
                let store = redo_store.clone();
                let scope = redo_scope.clone();
                let ids = redo_order.clone();
                async move { persist_order(store.as_ref(), &scope, ids).await }
            },
        ));
    }
    Ok(next)
}

/// Destination order after a batch drop.
///
/// Starts from `existing` minus every dragged id, then places the dragged
/// block:
/// - next to `target` when it is a surviving sibling,
/// - at the target's original slot (shifted left by the dragged ids that
///   preceded it) when the target is itself dragged,
/// - at the end otherwise.
pub fn final_destination_order(
    existing: &[String],
    dragged: &[String],
    target: Option<&str>,
    position: DropPosition,
) -> Vec<String> {
    let mut order: Vec<String> = existing
        .iter()
        .filter(|id| !dragged.contains(id))
        .cloned()
        .collect();
    let insert_at = match target {
        Some(target) if !dragged.iter().any(|d| d == target) => {
            order.iter().position(|id| id == target).map(|idx| match position {
                DropPosition::Before => idx,
                DropPosition::After => idx + 1,
            })
        }
        Some(target) => existing.iter().position(|id| id == target).map(|original| {
            let preceding = dragged
                .iter()
                .filter_map(|d| existing.iter().position(|id| id == d))
                .filter(|idx| *idx < original)
                .count();
            (original - preceding).min(order.len())
        }),
        None => None,
    };
    let at = insert_at.unwrap_or(order.len());
    order.splice(at..at, dragged.iter().cloned());
    order
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchMove {
    /// Dragged children in visual order.
    pub moves: Vec<DraggedChild>,
    pub to_parent_id: String,
    pub target_child_id: Option<String>,
    pub position: DropPosition,
    /// Destination children before the drop.
    pub existing: Vec<String>,
    /// Child order of every source parent before the drop, restored on undo.
    pub source_orders: Vec<(String, Vec<String>)>,
    pub child_kind: String,
    pub parent_kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchMoveResult {
    pub order: Vec<String>,
    pub crossed: Vec<DraggedChild>,
}

/// Re-parents every child that changes parent, then persists the final
/// destination order with one call.
pub async fn execute_batch_move(
    persistence: &Arc<dyn MenuPersistence>,
    history: Option<&mut UndoHistory>,
    request: BatchMove,
) -> PersistResult<BatchMoveResult> {
    let dragged: Vec<String> = request.moves.iter().map(|m| m.child_id.clone()).collect();
    let crossed: Vec<DraggedChild> = request
        .moves
        .iter()
        .filter(|m| m.from_parent_id != request.to_parent_id)
        .cloned()
        .collect();
    if request.moves.is_empty() {
        return Ok(BatchMoveResult {
            order: request.existing,
            crossed,
        });
    }

    let to = request.to_parent_id.clone();
    apply_moves(persistence.as_ref(), &crossed, &to).await?;
    let order = final_destination_order(
        &request.existing,
        &dragged,
        request.target_child_id.as_deref(),
        request.position,
    );
    debug!(to = %to, moved = crossed.len(), total = dragged.len(), "persist batch move");
    persistence
        .reorder_children(to.clone(), order.clone())
        .await?;

    if let Some(history) = history {
        let label = HistoryLabel::batch_move(
            &request.child_kind,
            &request.parent_kind,
            dragged.len(),
            !crossed.is_empty(),
        );
        history.push(batch_undo(
            label,
            persistence.clone(),
            crossed.clone(),
            to,
            request.existing,
            request.source_orders,
            order.clone(),
        ));
    }
    Ok(BatchMoveResult { order, crossed })
}

async fn apply_moves(
    persistence: &dyn MenuPersistence,
    moves: &[DraggedChild],
    to: &str,
) -> PersistResult<()> {
    for m in moves {
        persistence
            .move_child(
                m.child_id.clone(),
                m.from_parent_id.clone(),
                to.to_string(),
                None,
                DropPosition::After,
            )
            .await?;
    }
    Ok(())
}

async fn revert_moves(
    persistence: &dyn MenuPersistence,
    moves: &[DraggedChild],
    to: &str,
) -> PersistResult<()> {
    for m in moves.iter().rev() {
        persistence
            .move_child(
                m.child_id.clone(),
                to.to_string(),
                m.from_parent_id.clone(),
                None,
                DropPosition::After,
            )
            .await?;
    }
    Ok(())
}

fn batch_undo(
    label: HistoryLabel,
    persistence: Arc<dyn MenuPersistence>,
    crossed: Vec<DraggedChild>,
    to: String,
    existing: Vec<String>,
    source_orders: Vec<(String, Vec<String>)>,
    order: Vec<String>,
) -> UndoAction {
    let undo_store = persistence.clone();
    let undo_moves = crossed.clone();
    let undo_to = to.clone();
    UndoAction::new(
        label,
        move || {
            let store = undo_store.clone();
            let moves = undo_moves.clone();
            let to = undo_to.clone();
            let existing = existing.clone();
            let sources = source_orders.clone();
            async move {
                revert_moves(store.as_ref(), &moves, &to).await?;
                store.reorder_children(to, existing).await?;
                for (parent_id, ids) in sources {
                    store.reorder_children(parent_id, ids).await?;
                }
                Ok(())
            }
        },
        move || {
            let store = persistence.clone();
            let moves = crossed.clone();
            let to = to.clone();
            let order = order.clone();
            async move {
                apply_moves(store.as_ref(), &moves, &to).await?;
                store.reorder_children(to, order).await
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnd::DropPosition::{After, Before};
    use crate::persistence::{MemoryMenuStore, PersistCall, PersistError};
    use crate::registry::{MenuCategory, MenuLabel, MenuTree};

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn child(id: &str, from: &str) -> DraggedChild {
        DraggedChild {
            child_id: id.to_string(),
            from_parent_id: from.to_string(),
        }
    }

    #[test]
    fn final_order_next_to_surviving_sibling() {
        let existing = ids(&["x", "y", "z"]);
        let dragged = ids(&["c1", "c2"]);
        assert_eq!(
            final_destination_order(&existing, &dragged, Some("y"), Before),
            ["x", "c1", "c2", "y", "z"]
        );
        assert_eq!(
            final_destination_order(&existing, &dragged, Some("z"), After),
            ["x", "y", "z", "c1", "c2"]
        );
        assert_eq!(
            final_destination_order(&existing, &dragged, None, Before),
            ["x", "y", "z", "c1", "c2"]
        );
    }

    #[test]
    fn final_order_when_target_is_dragged() {
        // y and a are dragged; y sat at index 2 with a before it.
        let existing = ids(&["a", "b", "y", "c"]);
        let dragged = ids(&["y", "a", "n"]);
        assert_eq!(
            final_destination_order(&existing, &dragged, Some("y"), Before),
            ["b", "y", "a", "n", "c"]
        );
        // Target missing from the destination appends.
        assert_eq!(
            final_destination_order(&existing, &ids(&["n"]), Some("n"), After),
            ["a", "b", "y", "c", "n"]
        );
    }

    fn store() -> Arc<MemoryMenuStore> {
        Arc::new(MemoryMenuStore::new(MenuTree::new(vec![
            MenuLabel::new("P1", 0).with_categories(vec![
                MenuCategory::new("c1", 0),
                MenuCategory::new("k1", 1),
            ]),
            MenuLabel::new("P2", 1).with_categories(vec![MenuCategory::new("c2", 0)]),
            MenuLabel::new("P3", 2).with_categories(vec![
                MenuCategory::new("t", 0),
                MenuCategory::new("u", 1),
            ]),
        ])))
    }

    fn batch(target: Option<&str>, position: DropPosition) -> BatchMove {
        BatchMove {
            moves: vec![child("c1", "P1"), child("c2", "P2")],
            to_parent_id: "P3".into(),
            target_child_id: target.map(str::to_string),
            position,
            existing: ids(&["t", "u"]),
            source_orders: vec![
                ("P1".into(), ids(&["c1", "k1"])),
                ("P2".into(), ids(&["c2"])),
            ],
            child_kind: "category".into(),
            parent_kind: "label".into(),
        }
    }

    #[tokio::test]
    async fn batch_move_reparents_then_orders_once() {
        let store = store();
        let persistence: Arc<dyn MenuPersistence> = store.clone();
        let mut history = UndoHistory::default();
        let result = execute_batch_move(&persistence, Some(&mut history), batch(Some("u"), Before))
            .await
            .unwrap();
        assert_eq!(result.order, ["t", "c1", "c2", "u"]);
        assert_eq!(result.crossed.len(), 2);
        assert_eq!(store.tree().category_order("P3"), ["t", "c1", "c2", "u"]);
        assert_eq!(store.tree().category_order("P1"), ["k1"]);

        let calls = store.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(&calls[2], PersistCall::ReorderChildren { parent_id, .. } if parent_id == "P3"));
        assert_eq!(history.undo_labels(), ["move:2-categories"]);

        history.undo().await.unwrap();
        let tree = store.tree();
        assert_eq!(tree.category_order("P3"), ["t", "u"]);
        assert_eq!(tree.category_order("P1"), ["c1", "k1"]);
        assert_eq!(tree.category_order("P2"), ["c2"]);

        history.redo().await.unwrap();
        assert_eq!(store.tree().category_order("P3"), ["t", "c1", "c2", "u"]);
    }

    #[tokio::test]
    async fn batch_move_within_destination_is_a_reorder() {
        let store = store();
        let persistence: Arc<dyn MenuPersistence> = store.clone();
        let mut history = UndoHistory::default();
        let request = BatchMove {
            moves: vec![child("u", "P3")],
            existing: ids(&["t", "u"]),
            ..batch(None, Before)
        };
        let result = execute_batch_move(&persistence, Some(&mut history), request)
            .await
            .unwrap();
        assert!(result.crossed.is_empty());
        assert_eq!(result.order, ["t", "u"]);
        assert_eq!(history.undo_labels(), ["reorder:category"]);
    }

    #[tokio::test]
    async fn failed_move_propagates_without_history() {
        let store = store();
        store.fail_next(PersistError::Backend("timeout".into()));
        let persistence: Arc<dyn MenuPersistence> = store.clone();
        let mut history = UndoHistory::default();
        let err = execute_batch_move(&persistence, Some(&mut history), batch(None, After))
            .await
            .unwrap_err();
        assert_eq!(err, PersistError::Backend("timeout".into()));
        assert!(!history.can_undo());
    }

    #[tokio::test]
    async fn sibling_reorder_undo_restores_prior_order() {
        let store = store();
        let persistence: Arc<dyn MenuPersistence> = store.clone();
        let mut history = UndoHistory::default();
        let order = execute_reorder(
            &persistence,
            Some(&mut history),
            SiblingReorder {
                scope: ReorderScope::Roots,
                siblings: ids(&["P1", "P2", "P3"]),
                dragged_ids: ids(&["P3"]),
                target_id: "P1".into(),
                position: Before,
                label: HistoryLabel::reorder("label", 1, None),
            },
        )
        .await
        .unwrap();
        assert_eq!(order, ["P3", "P1", "P2"]);
        assert_eq!(store.tree().label_order(), ["P3", "P1", "P2"]);
        history.undo().await.unwrap();
        assert_eq!(store.tree().label_order(), ["P1", "P2", "P3"]);
    }
}
