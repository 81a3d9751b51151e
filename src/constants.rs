//! Shared crate-wide constants.

use std::time::Duration;

/// Separator between id segments in a composite row key.
///
/// Entity ids are frequently UUIDs, which already contain `-`, so the
/// separator has to be a character that never shows up in a natural id.
pub const KEY_SEGMENT_SEPARATOR: char = '~';

/// Separator between the kind tag and the composite id in a row key.
pub const KEY_KIND_SEPARATOR: char = ':';

/// Minimum spacing between two committed drag-over updates.
///
/// Pointer motion arrives at roughly 60 events per second while dragging.
/// Only the freshest sample inside each window is applied.
pub const DRAG_OVER_THROTTLE: Duration = Duration::from_millis(50);

/// How long a drag has to hover a collapsed parent before it auto-expands.
pub const AUTO_EXPAND_DELAY: Duration = Duration::from_millis(500);

/// How long an auto-expanded parent keeps its "just expanded" highlight.
///
/// Longer than [`AUTO_EXPAND_DELAY`] so the highlight outlives the hover
/// that triggered it.
pub const AUTO_EXPANDED_FLASH: Duration = Duration::from_millis(600);

/// Two mouse-downs on the same row within this window form a double click.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(500);

/// Number of undo entries kept per view.
pub const UNDO_DEPTH: usize = 10;

/// Number of lines retained by the in-process log buffer.
pub const LOG_BUFFER_LINES: usize = 2000;
