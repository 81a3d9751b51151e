//! Persistence seam for drop and move mutations.
//!
//! The engines await these calls but never retry them; failures travel back
//! to the caller through [`PersistResult`].

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::dnd::DropPosition;
use crate::registry::MenuTree;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    #[error("mutation rejected: {0}")]
    Rejected(String),
    #[error("entity not found: {0}")]
    NotFound(String),
    #[error("backend failure: {0}")]
    Backend(String),
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Single sibling list, used by flat tables.
#[async_trait]
pub trait FlatReorder: Send + Sync {
    async fn reorder(&self, ids: Vec<String>) -> PersistResult<()>;
}

/// Two-level menu mutations.
#[async_trait]
pub trait MenuPersistence: Send + Sync {
    async fn reorder_roots(&self, ids: Vec<String>) -> PersistResult<()>;

    async fn reorder_children(&self, parent_id: String, ids: Vec<String>) -> PersistResult<()>;

    /// Re-parents one child. `anchor` is an optional sibling to land next
    /// to; without one the child is appended.
    async fn move_child(
        &self,
        child_id: String,
        from_parent_id: String,
        to_parent_id: String,
        anchor: Option<String>,
        position: DropPosition,
    ) -> PersistResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistCall {
    ReorderRoots(Vec<String>),
    ReorderChildren {
        parent_id: String,
        ids: Vec<String>,
    },
    MoveChild {
        child_id: String,
        from: String,
        to: String,
    },
}

#[derive(Debug, Default)]
struct MemoryInner {
    tree: MenuTree,
    calls: Vec<PersistCall>,
    fail_next: Option<PersistError>,
}

/// In-process store backed by a [`MenuTree`]. Records every call and can be
/// told to fail the next one.
#[derive(Debug, Default)]
pub struct MemoryMenuStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryMenuStore {
    pub fn new(tree: MenuTree) -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                tree,
                calls: Vec::new(),
                fail_next: None,
            }),
        }
    }

    pub fn tree(&self) -> MenuTree {
        self.inner
            .lock()
            .map(|inner| inner.tree.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<PersistCall> {
        self.inner
            .lock()
            .map(|inner| inner.calls.clone())
            .unwrap_or_default()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.calls.clear();
        }
    }

    pub fn fail_next(&self, error: PersistError) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_next = Some(error);
        }
    }

    fn apply(&self, call: PersistCall) -> PersistResult<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| PersistError::Backend("store lock poisoned".into()))?;
        if let Some(error) = inner.fail_next.take() {
            return Err(error);
        }
        match &call {
            PersistCall::ReorderRoots(ids) => inner.tree.reorder_labels(ids),
            PersistCall::ReorderChildren { parent_id, ids } => {
                if !inner.tree.reorder_categories(parent_id, ids) {
                    return Err(PersistError::NotFound(parent_id.clone()));
                }
            }
            PersistCall::MoveChild { child_id, from, to } => {
                if !inner.tree.move_category(child_id, from, to) {
                    return Err(PersistError::NotFound(child_id.clone()));
                }
            }
        }
        inner.calls.push(call);
        Ok(())
    }
}

#[async_trait]
impl MenuPersistence for MemoryMenuStore {
    async fn reorder_roots(&self, ids: Vec<String>) -> PersistResult<()> {
        self.apply(PersistCall::ReorderRoots(ids))
    }

    async fn reorder_children(&self, parent_id: String, ids: Vec<String>) -> PersistResult<()> {
        self.apply(PersistCall::ReorderChildren { parent_id, ids })
    }

    async fn move_child(
        &self,
        child_id: String,
        from_parent_id: String,
        to_parent_id: String,
        _anchor: Option<String>,
        _position: DropPosition,
    ) -> PersistResult<()> {
        self.apply(PersistCall::MoveChild {
            child_id,
            from: from_parent_id,
            to: to_parent_id,
        })
    }
}

/// Flat tables persist through the root order.
#[async_trait]
impl FlatReorder for MemoryMenuStore {
    async fn reorder(&self, ids: Vec<String>) -> PersistResult<()> {
        self.apply(PersistCall::ReorderRoots(ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{MenuCategory, MenuLabel};

    fn store() -> MemoryMenuStore {
        MemoryMenuStore::new(MenuTree::new(vec![
            MenuLabel::new("L1", 0).with_categories(vec![MenuCategory::new("C1", 0)]),
            MenuLabel::new("L2", 1),
        ]))
    }

    #[tokio::test]
    async fn records_and_applies_calls() {
        let store = store();
        store
            .reorder_roots(vec!["L2".into(), "L1".into()])
            .await
            .unwrap();
        store
            .move_child("C1".into(), "L1".into(), "L2".into(), None, DropPosition::After)
            .await
            .unwrap();
        assert_eq!(store.tree().label_order(), ["L2", "L1"]);
        assert_eq!(store.tree().category_order("L2"), ["C1"]);
        assert_eq!(store.calls().len(), 2);
    }

    #[tokio::test]
    async fn fail_next_fails_once() {
        let store = store();
        store.fail_next(PersistError::Backend("offline".into()));
        let err = store.reorder(vec!["L2".into()]).await.unwrap_err();
        assert_eq!(err.to_string(), "backend failure: offline");
        assert!(store.calls().is_empty());
        store.reorder(vec!["L2".into()]).await.unwrap();
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn unknown_parent_is_not_found() {
        let store = store();
        let err = store
            .reorder_children("nope".into(), vec![])
            .await
            .unwrap_err();
        assert_eq!(err, PersistError::NotFound("nope".into()));
    }
}
