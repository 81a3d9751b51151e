//! Drag-and-drop: eligibility, the shared reorder primitive, and the two
//! session engines (flat list and two-level menu).

pub mod eligibility;
pub mod grouped;
pub mod hierarchy;
pub mod moves;
pub mod reorder;
pub mod throttle;

use std::fmt;

use ratatui::layout::{Position, Rect};

pub use eligibility::{
    DragEligibility, DraggedEntity, derive_eligibility, draggable_entities,
    is_drag_handle_always_visible, is_drag_handle_enabled,
};
pub use grouped::{DragClasses, DragSession, DropPlan, GroupedReorder};
pub use hierarchy::{DraggedChild, DropOutcome, DropType, HierarchicalDnd, MenuDragClasses, drop_info};
pub use moves::{
    BatchMove, BatchMoveResult, ReorderScope, SiblingReorder, execute_batch_move, execute_reorder,
    final_destination_order,
};
pub use reorder::reorder;
pub use throttle::Throttle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DropPosition {
    #[default]
    Before,
    After,
}

impl DropPosition {
    /// Which side of the row at `rect` the pointer is on.
    ///
    /// Targets two or more rows tall split at their vertical midpoint. A
    /// one-row target has no lower half, so it splits at its horizontal
    /// midpoint instead: left is `Before`, right is `After`.
    pub fn from_pointer(pointer: Position, rect: Rect) -> Self {
        let (offset, extent) = if rect.height > 1 {
            (pointer.y.saturating_sub(rect.y), rect.height)
        } else {
            (pointer.x.saturating_sub(rect.x), rect.width)
        };
        if u32::from(offset) * 2 < u32::from(extent) {
            DropPosition::Before
        } else {
            DropPosition::After
        }
    }
}

impl fmt::Display for DropPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DropPosition::Before => "before",
            DropPosition::After => "after",
        };
        write!(f, "{}", s)
    }
}
