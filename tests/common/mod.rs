#![allow(dead_code)]

use std::sync::Arc;

use menu_dnd::expand::ExpandedSet;
use menu_dnd::persistence::MemoryMenuStore;
use menu_dnd::registry::{IdentityRegistry, MenuCategory, MenuLabel, MenuTree};
use menu_dnd::dnd::DropPosition;
use ratatui::layout::{Position, Rect};

/// One terminal row at y=10, 40 columns wide.
pub const ROW: Rect = Rect {
    x: 0,
    y: 10,
    width: 40,
    height: 1,
};

/// Drop side for a pointer at `column` on [`ROW`].
pub fn pointer(column: u16) -> DropPosition {
    DropPosition::from_pointer(Position::new(column, ROW.y), ROW)
}

/// `(label, [categories])` in display order.
pub fn menu(layout: &[(&str, &[&str])]) -> MenuTree {
    let labels = layout
        .iter()
        .enumerate()
        .map(|(l, (label, categories))| {
            let categories = categories
                .iter()
                .enumerate()
                .map(|(c, id)| MenuCategory::new(*id, c as i64))
                .collect();
            MenuLabel::new(*label, l as i64).with_categories(categories)
        })
        .collect();
    MenuTree::new(labels)
}

/// P1 [c1, k1], P2 [c2], P3 [t, u].
pub fn three_labels() -> MenuTree {
    menu(&[("P1", &["c1", "k1"]), ("P2", &["c2"]), ("P3", &["t", "u"])])
}

pub fn expanded(ids: &[&str]) -> ExpandedSet {
    let mut set = ExpandedSet::new();
    set.expand_all(ids.iter().copied());
    set
}

pub fn registry(tree: &MenuTree, open: &ExpandedSet) -> IdentityRegistry {
    tree.rows(open).1
}

pub fn store(tree: MenuTree) -> Arc<MemoryMenuStore> {
    Arc::new(MemoryMenuStore::new(tree))
}

pub fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn category_key(label: &str, category: &str) -> String {
    format!("category:{label}~{category}")
}
