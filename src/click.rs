//! Row click coordination.
//!
//! Turns a `(key, shift)` click into selection-model calls and keeps the
//! expand state of parent rows in step with their selection.

use std::time::{Duration, Instant};

use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tracing::debug;

use crate::config::DndConfig;
use crate::expand::ExpandState;
use crate::registry::IdentityRegistry;
use crate::selection::{CheckboxState, SelectionModel, SelectionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Click {
    Single { shift: bool },
    Double,
}

/// Classifies left-button downs into single and double clicks per row.
#[derive(Debug, Clone)]
pub struct ClickTracker {
    last: Option<(String, Instant)>,
    window: Duration,
}

impl ClickTracker {
    pub fn new(window: Duration) -> Self {
        Self { last: None, window }
    }

    pub fn register(&mut self, key: &str, event: &MouseEvent, now: Instant) -> Option<Click> {
        if !matches!(event.kind, MouseEventKind::Down(MouseButton::Left)) {
            return None;
        }
        if let Some((prev_key, prev)) = &self.last
            && prev_key == key
            && now.duration_since(*prev) <= self.window
        {
            self.last = None;
            return Some(Click::Double);
        }
        self.last = Some((key.to_string(), now));
        Some(Click::Single {
            shift: event.modifiers.contains(KeyModifiers::SHIFT),
        })
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for ClickTracker {
    fn default() -> Self {
        Self::new(DndConfig::default().double_click_window())
    }
}

/// Everything a click may touch, borrowed for the duration of one event.
pub struct RowContext<'a, S: SelectionStore> {
    pub registry: &'a IdentityRegistry,
    pub model: &'a mut SelectionModel,
    pub store: &'a mut S,
    pub expand: Option<&'a mut dyn ExpandState>,
}

impl<'a, S: SelectionStore> RowContext<'a, S> {
    pub fn new(registry: &'a IdentityRegistry, model: &'a mut SelectionModel, store: &'a mut S) -> Self {
        Self {
            registry,
            model,
            store,
            expand: None,
        }
    }

    pub fn with_expand(mut self, expand: &'a mut dyn ExpandState) -> Self {
        self.expand = Some(expand);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Unknown key or non-click event.
    Ignored,
    RangeSelected(isize),
    Toggled,
    Navigated,
}

type NavigateFn = Box<dyn FnMut(&str, &str)>;

pub struct RowClickHandler {
    navigate: Option<NavigateFn>,
    range_select: bool,
    hierarchy_toggle: bool,
    tracker: ClickTracker,
}

impl RowClickHandler {
    pub fn new(config: &DndConfig) -> Self {
        Self {
            navigate: None,
            range_select: true,
            hierarchy_toggle: true,
            tracker: ClickTracker::new(config.double_click_window()),
        }
    }

    /// Double-click target, called with `(kind, entity_id)`.
    pub fn with_navigate(mut self, navigate: impl FnMut(&str, &str) + 'static) -> Self {
        self.navigate = Some(Box::new(navigate));
        self
    }

    pub fn without_range_select(mut self) -> Self {
        self.range_select = false;
        self
    }

    pub fn with_plain_toggle(mut self) -> Self {
        self.hierarchy_toggle = false;
        self
    }

    pub fn handle_click<S: SelectionStore>(
        &mut self,
        ctx: RowContext<'_, S>,
        key: &str,
        shift: bool,
    ) -> ClickOutcome {
        let RowContext {
            registry,
            model,
            store,
            expand,
        } = ctx;
        let Some(identity) = registry.get(key) else {
            return ClickOutcome::Ignored;
        };

        if shift && self.range_select && model.anchor().is_some() {
            let affected = model.range_select(registry, store, key);
            return ClickOutcome::RangeSelected(affected);
        }

        if identity.is_expandable
            && let Some(expand) = expand
        {
            let state = model.snapshot(registry, &*store).checkbox_state(key);
            // Indeterminate counts as "about to select everything".
            let will_be_selected = state != CheckboxState::Checked;
            let expanded = expand.is_expanded(&identity.entity_id);
            if will_be_selected && !expanded {
                expand.expand(&identity.entity_id);
            } else if !will_be_selected && expanded {
                expand.collapse(&identity.entity_id);
            }
            debug!(key = %key, will_be_selected, "synced expand with selection");
        }

        if self.hierarchy_toggle {
            model.on_toggle_with_hierarchy(registry, store, key);
        } else {
            model.on_toggle(store, key);
        }
        ClickOutcome::Toggled
    }

    pub fn handle_double_click(&mut self, registry: &IdentityRegistry, key: &str) -> ClickOutcome {
        let Some(navigate) = self.navigate.as_mut() else {
            return ClickOutcome::Ignored;
        };
        let Some(identity) = registry.get(key) else {
            return ClickOutcome::Ignored;
        };
        navigate(&identity.kind, &identity.entity_id);
        ClickOutcome::Navigated
    }

    /// Routes a raw mouse event on the row `key`.
    pub fn handle_mouse<S: SelectionStore>(
        &mut self,
        ctx: RowContext<'_, S>,
        key: &str,
        event: &MouseEvent,
        now: Instant,
    ) -> ClickOutcome {
        match self.tracker.register(key, event, now) {
            Some(Click::Single { shift }) => self.handle_click(ctx, key, shift),
            Some(Click::Double) => self.handle_double_click(ctx.registry, key),
            None => ClickOutcome::Ignored,
        }
    }
}

impl Default for RowClickHandler {
    fn default() -> Self {
        Self::new(&DndConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::expand::{AllExpanded, ExpandedSet};
    use crate::registry::{MenuCategory, MenuLabel, MenuTree};
    use crate::selection::KeySelection;

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

    fn mouse_down(modifiers: KeyModifiers) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 0,
            row: 0,
            modifiers,
        }
    }

    #[test]
    fn selecting_parent_expands_and_deselecting_collapses() {
        let registry = registry();
        let mut model = SelectionModel::hierarchy();
        let mut store = KeySelection::new();
        let mut expanded = ExpandedSet::new();
        let mut handler = RowClickHandler::default();

        let ctx = RowContext::new(&registry, &mut model, &mut store).with_expand(&mut expanded);
        assert_eq!(handler.handle_click(ctx, "label:L1", false), ClickOutcome::Toggled);
        assert!(expanded.is_expanded("L1"));
        assert_eq!(store.len(), 3);

        let ctx = RowContext::new(&registry, &mut model, &mut store).with_expand(&mut expanded);
        handler.handle_click(ctx, "label:L1", false);
        assert!(!expanded.is_expanded("L1"));
        assert!(store.is_empty());
    }

    #[test]
    fn shift_click_needs_an_anchor() {
        let registry = registry();
        let mut model = SelectionModel::hierarchy();
        let mut store = KeySelection::new();
        let mut handler = RowClickHandler::default();

        let ctx = RowContext::new(&registry, &mut model, &mut store);
        assert_eq!(handler.handle_click(ctx, "category:L1~C1", true), ClickOutcome::Toggled);
        let ctx = RowContext::new(&registry, &mut model, &mut store);
        assert_eq!(
            handler.handle_click(ctx, "label:L2", true),
            ClickOutcome::RangeSelected(2)
        );
        assert_eq!(
            store.selected_keys(),
            ["category:L1~C1", "category:L1~C2", "label:L2"]
        );
    }

    #[test]
    fn unknown_key_is_ignored() {
        let registry = registry();
        let mut model = SelectionModel::hierarchy();
        let mut store = KeySelection::new();
        let mut handler = RowClickHandler::default();
        let ctx = RowContext::new(&registry, &mut model, &mut store);
        assert_eq!(handler.handle_click(ctx, "label:nope", false), ClickOutcome::Ignored);
        assert!(store.is_empty());
    }

    #[test]
    fn double_click_navigates_without_touching_selection() {
        let registry = registry();
        let visited = Rc::new(RefCell::new(Vec::new()));
        let sink = visited.clone();
        let mut handler = RowClickHandler::default()
            .with_navigate(move |kind, id| sink.borrow_mut().push(format!("{kind}/{id}")));
        let mut model = SelectionModel::hierarchy();
        let mut store = KeySelection::new();
        let t0 = Instant::now();

        let ctx = RowContext::new(&registry, &mut model, &mut store);
        handler.handle_mouse(ctx, "label:L2", &mouse_down(KeyModifiers::NONE), t0);
        assert_eq!(store.len(), 1);

        let ctx = RowContext::new(&registry, &mut model, &mut store);
        let outcome = handler.handle_mouse(
            ctx,
            "label:L2",
            &mouse_down(KeyModifiers::NONE),
            t0 + Duration::from_millis(200),
        );
        assert_eq!(outcome, ClickOutcome::Navigated);
        assert_eq!(store.len(), 1);
        assert_eq!(visited.borrow().as_slice(), ["label/L2"]);
    }

    #[test]
    fn tracker_expires_double_click_window() {
        let mut tracker = ClickTracker::new(Duration::from_millis(500));
        let t0 = Instant::now();
        let ev = mouse_down(KeyModifiers::SHIFT);
        assert_eq!(
            tracker.register("a", &ev, t0),
            Some(Click::Single { shift: true })
        );
        assert_eq!(
            tracker.register("a", &ev, t0 + Duration::from_millis(600)),
            Some(Click::Single { shift: true })
        );
        assert_eq!(
            tracker.register("b", &ev, t0 + Duration::from_millis(700)),
            Some(Click::Single { shift: true })
        );
        let up = MouseEvent {
            kind: MouseEventKind::Up(MouseButton::Left),
            ..ev
        };
        assert_eq!(tracker.register("b", &up, t0), None);
    }
}
