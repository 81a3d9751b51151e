use crossterm::event::KeyEvent;
use tracing::debug;

use crate::actions::HistoryLabel;
use crate::click::RowContext;
use crate::config::DndConfig;
use crate::dnd::DragEligibility;
use crate::expand::ExpandedSet;
use crate::history::{HistoryStacks, UndoHistory};
use crate::keybindings::{EditorAction, KeyBindings};
use crate::persistence::PersistResult;
use crate::registry::IdentityRegistry;
use crate::registry::key::{CATEGORY_KIND, LABEL_KIND};
use crate::selection::{KeySelection, SelectionMode, SelectionModel, SelectionStore};

/// Editor screens. Each keeps its own undo history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewType {
    /// Labels with their categories nested underneath.
    #[default]
    Menu,
    Label,
    Category,
    AllLabels,
    AllCategories,
}

impl ViewType {
    pub fn selection_mode(self) -> SelectionMode {
        match self {
            ViewType::Menu => SelectionMode::Hierarchy,
            _ => SelectionMode::Flat,
        }
    }

    /// Detail view for an entity kind, if it has one.
    pub fn for_kind(kind: &str) -> Option<Self> {
        match kind {
            LABEL_KIND => Some(ViewType::Label),
            CATEGORY_KIND => Some(ViewType::Category),
            _ => None,
        }
    }
}

pub struct EditorState {
    view: ViewType,
    entity_id: Option<String>,
    view_dirty: bool,
    selection: KeySelection,
    model: SelectionModel,
    expanded: ExpandedSet,
    history: HistoryStacks,
    bindings: KeyBindings,
    focused: Option<String>,
}

impl EditorState {
    pub fn new(config: &DndConfig) -> Self {
        let view = ViewType::default();
        Self {
            view,
            entity_id: None,
            view_dirty: false,
            selection: KeySelection::new(),
            model: SelectionModel::new(view.selection_mode()),
            expanded: ExpandedSet::new(),
            history: HistoryStacks::new(config.undo_depth()),
            bindings: KeyBindings::default(),
            focused: None,
        }
    }

    pub fn with_bindings(mut self, bindings: KeyBindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn view(&self) -> ViewType {
        self.view
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Switches screens. Selection, anchor, and the history of the screen
    /// being left are reset. Re-entering the current screen is a no-op.
    pub fn navigate(&mut self, view: ViewType) {
        self.navigate_inner(view, None);
    }

    /// Opens the detail view for `(kind, entity_id)`, as a double click does.
    /// Returns false for kinds without a detail view.
    pub fn navigate_to_entity(&mut self, kind: &str, entity_id: &str) -> bool {
        let Some(view) = ViewType::for_kind(kind) else {
            return false;
        };
        self.navigate_inner(view, Some(entity_id.to_string()));
        true
    }

    fn navigate_inner(&mut self, view: ViewType, entity_id: Option<String>) {
        if self.view == view && self.entity_id == entity_id {
            return;
        }
        debug!(from = ?self.view, to = ?view, entity = ?entity_id, "navigate");
        self.history.reset(self.view);
        self.model = SelectionModel::new(view.selection_mode());
        self.selection.clear();
        self.focused = None;
        self.view = view;
        self.entity_id = entity_id;
        self.view_dirty = true;
    }

    pub fn take_view_change(&mut self) -> Option<ViewType> {
        if self.view_dirty {
            self.view_dirty = false;
            Some(self.view)
        } else {
            None
        }
    }

    pub fn selection(&self) -> &KeySelection {
        &self.selection
    }

    pub fn model(&self) -> &SelectionModel {
        &self.model
    }

    /// Replaces the selection, e.g. with keys re-issued after a move.
    pub fn replace_selection(&mut self, keys: Vec<String>) {
        if keys.is_empty() {
            self.selection.clear();
        } else {
            self.selection.select_many(keys);
        }
    }

    pub fn expanded(&self) -> &ExpandedSet {
        &self.expanded
    }

    pub fn expanded_mut(&mut self) -> &mut ExpandedSet {
        &mut self.expanded
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn set_focused(&mut self, key: Option<String>) {
        self.focused = key;
    }

    /// Click context over this state's selection and expand set.
    pub fn row_context<'a>(&'a mut self, registry: &'a IdentityRegistry) -> RowContext<'a, KeySelection> {
        RowContext::new(registry, &mut self.model, &mut self.selection).with_expand(&mut self.expanded)
    }

    pub fn eligibility(&self, registry: &IdentityRegistry) -> DragEligibility {
        DragEligibility::from_snapshot(&self.model.snapshot(registry, &self.selection), registry)
    }

    /// History of the current screen.
    pub fn history_mut(&mut self) -> &mut UndoHistory {
        self.history.get_mut(self.view)
    }

    pub fn history(&self) -> Option<&UndoHistory> {
        self.history.get(self.view)
    }

    pub async fn undo(&mut self) -> PersistResult<Option<HistoryLabel>> {
        self.history.get_mut(self.view).undo().await
    }

    pub async fn redo(&mut self) -> PersistResult<Option<HistoryLabel>> {
        self.history.get_mut(self.view).redo().await
    }

    /// Applies a bound key. Returns the action it triggered, if any.
    pub async fn handle_key(
        &mut self,
        registry: &IdentityRegistry,
        key: &KeyEvent,
    ) -> PersistResult<Option<EditorAction>> {
        let Some(action) = self.bindings.action_for_key(key) else {
            return Ok(None);
        };
        debug!(%action, "key action");
        match action {
            EditorAction::SelectAll => self.model.on_select_all(registry, &mut self.selection),
            EditorAction::ClearSelection => self.model.clear(&mut self.selection),
            EditorAction::Undo => {
                self.undo().await?;
            }
            EditorAction::Redo => {
                self.redo().await?;
            }
            EditorAction::ToggleFocused => {
                let Some(focused) = self.focused.clone() else {
                    return Ok(None);
                };
                if !registry.contains(&focused) {
                    return Ok(None);
                }
                self.model
                    .on_toggle_with_hierarchy(registry, &mut self.selection, &focused);
            }
        }
        Ok(Some(action))
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(&DndConfig::default())
    }
}
