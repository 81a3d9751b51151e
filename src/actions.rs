use std::fmt;

/// Undo entry label for drag mutations, e.g. `reorder:3-labels` or
/// `move:category-to-label`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HistoryLabel {
    /// Same-parent reorder. `parent_kind` is set when the siblings live under
    /// a parent rather than at the root.
    Reorder {
        kind: String,
        count: usize,
        parent_kind: Option<String>,
    },
    /// Batch drop onto a parent. `crossed` is false when every dragged child
    /// already belonged to the destination.
    Move {
        kind: String,
        parent_kind: String,
        count: usize,
        crossed: bool,
    },
}

impl HistoryLabel {
    pub fn reorder(kind: &str, count: usize, parent_kind: Option<&str>) -> Self {
        HistoryLabel::Reorder {
            kind: kind.to_string(),
            count,
            parent_kind: parent_kind.map(str::to_string),
        }
    }

    pub fn batch_move(kind: &str, parent_kind: &str, count: usize, crossed: bool) -> Self {
        HistoryLabel::Move {
            kind: kind.to_string(),
            parent_kind: parent_kind.to_string(),
            count,
            crossed,
        }
    }
}

fn plural(kind: &str) -> String {
    match kind.strip_suffix('y') {
        Some(stem) => format!("{stem}ies"),
        None => format!("{kind}s"),
    }
}

impl fmt::Display for HistoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryLabel::Reorder {
                kind,
                count,
                parent_kind,
            } => {
                let scope = parent_kind
                    .as_deref()
                    .map(|p| format!("-in-{p}"))
                    .unwrap_or_default();
                if *count > 1 {
                    write!(f, "reorder:{}-{}{}", count, plural(kind), scope)
                } else {
                    write!(f, "reorder:{}{}", plural(kind), scope)
                }
            }
            HistoryLabel::Move {
                kind,
                parent_kind,
                count,
                crossed,
            } => match (*crossed, *count > 1) {
                (true, true) => write!(f, "move:{}-{}", count, plural(kind)),
                (true, false) => write!(f, "move:{}-to-{}", kind, parent_kind),
                (false, true) => write!(f, "reorder:{}-{}", count, plural(kind)),
                (false, false) => write!(f, "reorder:{}", kind),
            },
        }
    }
}
