//! Bounded per-view undo/redo.
//!
//! Drag mutations push an [`UndoAction`] whose closures replay exact prior
//! and new states through the persistence seam. Each view keeps its own
//! [`UndoHistory`]; [`HistoryStacks`] is owned by the editor state, never a
//! process global.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::actions::HistoryLabel;
use crate::constants::UNDO_DEPTH;
use crate::persistence::PersistResult;
use crate::state::ViewType;

type Replay = Box<dyn Fn() -> BoxFuture<'static, PersistResult<()>> + Send + Sync>;

pub struct UndoAction {
    label: HistoryLabel,
    undo: Replay,
    redo: Replay,
}

impl UndoAction {
    pub fn new<U, UF, R, RF>(label: HistoryLabel, undo: U, redo: R) -> Self
    where
        U: Fn() -> UF + Send + Sync + 'static,
        UF: Future<Output = PersistResult<()>> + Send + 'static,
        R: Fn() -> RF + Send + Sync + 'static,
        RF: Future<Output = PersistResult<()>> + Send + 'static,
    {
        Self {
            label,
            undo: Box::new(move || undo().boxed()),
            redo: Box::new(move || redo().boxed()),
        }
    }

    pub fn label(&self) -> &HistoryLabel {
        &self.label
    }
}

impl fmt::Debug for UndoAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoAction")
            .field("label", &self.label.to_string())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct UndoHistory {
    undo: VecDeque<UndoAction>,
    redo: Vec<UndoAction>,
    depth: usize,
}

impl UndoHistory {
    pub fn new(depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            depth: depth.max(1),
        }
    }

    fn push_bounded(&mut self, action: UndoAction) {
        self.undo.push_back(action);
        while self.undo.len() > self.depth {
            self.undo.pop_front();
        }
    }

    /// Records a fresh mutation. Clears the redo stack.
    pub fn push(&mut self, action: UndoAction) {
        debug!(label = %action.label, "history push");
        self.push_bounded(action);
        self.redo.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Labels on the undo stack, oldest first.
    pub fn undo_labels(&self) -> Vec<String> {
        self.undo.iter().map(|a| a.label.to_string()).collect()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Replays the newest undo. On failure the entry stays where it was.
    pub async fn undo(&mut self) -> PersistResult<Option<HistoryLabel>> {
        let Some(action) = self.undo.pop_back() else {
            return Ok(None);
        };
        if let Err(error) = (action.undo)().await {
            warn!(label = %action.label, %error, "undo failed");
            self.undo.push_back(action);
            return Err(error);
        }
        debug!(label = %action.label, "undo applied");
        let label = action.label.clone();
        self.redo.push(action);
        Ok(Some(label))
    }

    /// Replays the newest redo. On failure the entry stays where it was.
    pub async fn redo(&mut self) -> PersistResult<Option<HistoryLabel>> {
        let Some(action) = self.redo.pop() else {
            return Ok(None);
        };
        if let Err(error) = (action.redo)().await {
            warn!(label = %action.label, %error, "redo failed");
            self.redo.push(action);
            return Err(error);
        }
        debug!(label = %action.label, "redo applied");
        let label = action.label.clone();
        self.push_bounded(action);
        Ok(Some(label))
    }
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(UNDO_DEPTH)
    }
}

/// One history per view.
#[derive(Debug)]
pub struct HistoryStacks {
    stacks: HashMap<ViewType, UndoHistory>,
    depth: usize,
}

impl HistoryStacks {
    pub fn new(depth: usize) -> Self {
        Self {
            stacks: HashMap::new(),
            depth,
        }
    }

    pub fn get(&self, view: ViewType) -> Option<&UndoHistory> {
        self.stacks.get(&view)
    }

    pub fn get_mut(&mut self, view: ViewType) -> &mut UndoHistory {
        let depth = self.depth;
        self.stacks
            .entry(view)
            .or_insert_with(|| UndoHistory::new(depth))
    }

    pub fn reset(&mut self, view: ViewType) {
        if let Some(history) = self.stacks.get_mut(&view) {
            history.clear();
        }
    }
}

impl Default for HistoryStacks {
    fn default() -> Self {
        Self::new(UNDO_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::persistence::PersistError;

    fn recording(log: &Arc<Mutex<Vec<String>>>, name: &str) -> UndoAction {
        let undo_log = log.clone();
        let redo_log = log.clone();
        let undo_name = format!("undo {name}");
        let redo_name = format!("redo {name}");
        UndoAction::new(
            HistoryLabel::reorder("label", 1, None),
            move || {
                let log = undo_log.clone();
                let entry = undo_name.clone();
                async move {
                    log.lock().unwrap().push(entry);
                    Ok(())
                }
            },
            move || {
                let log = redo_log.clone();
                let entry = redo_name.clone();
                async move {
                    log.lock().unwrap().push(entry);
                    Ok(())
                }
            },
        )
    }

    #[tokio::test]
    async fn undo_then_redo_round_trips() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut history = UndoHistory::new(10);
        history.push(recording(&log, "a"));
        history.push(recording(&log, "b"));

        assert!(history.undo().await.unwrap().is_some());
        assert_eq!(history.redo_len(), 1);
        assert!(history.redo().await.unwrap().is_some());
        assert_eq!(history.undo_len(), 2);
        assert_eq!(*log.lock().unwrap(), vec!["undo b", "redo b"]);
    }

    #[tokio::test]
    async fn push_clears_redo_and_depth_is_bounded() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut history = UndoHistory::new(2);
        for name in ["a", "b", "c"] {
            history.push(recording(&log, name));
        }
        assert_eq!(history.undo_len(), 2);
        history.undo().await.unwrap();
        assert!(history.can_redo());
        history.push(recording(&log, "d"));
        assert!(!history.can_redo());
    }

    #[tokio::test]
    async fn failed_undo_keeps_entry() {
        let mut history = UndoHistory::new(10);
        history.push(UndoAction::new(
            HistoryLabel::reorder("label", 1, None),
            || async { Err(PersistError::Backend("down".into())) },
            || async { Ok(()) },
        ));
        assert!(history.undo().await.is_err());
        assert_eq!(history.undo_len(), 1);
        assert_eq!(history.redo_len(), 0);
    }

    #[tokio::test]
    async fn empty_history_is_a_no_op() {
        let mut history = UndoHistory::default();
        assert_eq!(history.undo().await.unwrap(), None);
        assert_eq!(history.redo().await.unwrap(), None);
    }

    #[test]
    fn stacks_are_per_view() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut stacks = HistoryStacks::default();
        stacks.get_mut(ViewType::Menu).push(recording(&log, "a"));
        assert_eq!(stacks.get(ViewType::Menu).map(|h| h.undo_len()), Some(1));
        assert!(stacks.get(ViewType::AllLabels).is_none());
        stacks.reset(ViewType::Menu);
        assert_eq!(stacks.get(ViewType::Menu).map(|h| h.undo_len()), Some(0));
    }
}
