//! Row production for tree-shaped menu data.
//!
//! [`TreeNode::rows`] is the single traversal that yields both the rendered
//! row list and the identity registry, so the registry's visual order is the
//! row order by construction.

use crate::expand::ExpandState;

use super::key::{CATEGORY_KIND, LABEL_KIND, PRODUCT_KIND, create_key};
use super::{IdentityRegistry, RowIdentity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub kind: String,
    pub entity_id: String,
    pub name: String,
    pub contains_kinds: Vec<String>,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(kind: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            entity_id: entity_id.into(),
            name: String::new(),
            contains_kinds: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_contains(mut self, kind: impl Into<String>) -> Self {
        self.contains_kinds.push(kind.into());
        self
    }

    pub fn with_children(mut self, children: Vec<TreeNode>) -> Self {
        self.children = children;
        self
    }

    /// Rendered rows plus registry for a forest of nodes.
    ///
    /// Children of a collapsed node are registered (so selection cascades
    /// reach them) but produce no row and get no visual position.
    pub fn rows(roots: &[TreeNode], expanded: &impl ExpandState) -> (Vec<FlatRow>, IdentityRegistry) {
        let mut staged = Vec::new();
        let mut rows = Vec::new();
        let mut path = Vec::new();
        for root in roots {
            visit(root, &mut path, None, 0, true, expanded, &mut staged, &mut rows);
        }
        let mut registry = IdentityRegistry::new();
        for (identity, visible) in staged {
            registry.insert(identity, visible);
        }
        (rows, registry)
    }
}

#[allow(clippy::too_many_arguments)]
fn visit<'a>(
    node: &'a TreeNode,
    path: &mut Vec<&'a str>,
    parent: Option<(&str, &str)>,
    depth: usize,
    visible: bool,
    expanded: &impl ExpandState,
    staged: &mut Vec<(RowIdentity, bool)>,
    rows: &mut Vec<FlatRow>,
) -> Vec<String> {
    path.push(node.entity_id.as_str());
    let key = create_key(&node.kind, path.iter());
    let is_expandable = !node.children.is_empty();
    let is_expanded = is_expandable && expanded.is_expanded(&node.entity_id);

    let slot = staged.len();
    staged.push((
        RowIdentity {
            key: key.clone(),
            kind: node.kind.clone(),
            entity_id: node.entity_id.clone(),
            depth,
            parent_key: parent.map(|(k, _)| k.to_string()),
            child_keys: Vec::new(),
            is_expandable,
            contains_kinds: node.contains_kinds.clone(),
        },
        visible,
    ));
    if visible {
        rows.push(FlatRow {
            key: key.clone(),
            kind: node.kind.clone(),
            entity_id: node.entity_id.clone(),
            name: node.name.clone(),
            depth,
            parent_id: parent.map(|(_, id)| id.to_string()),
            is_expandable,
            is_expanded,
        });
    }

    let mut descendants = Vec::new();
    for child in &node.children {
        descendants.extend(visit(
            child,
            path,
            Some((key.as_str(), node.entity_id.as_str())),
            depth + 1,
            visible && is_expanded,
            expanded,
            staged,
            rows,
        ));
    }
    path.pop();

    staged[slot].0.child_keys = descendants.clone();
    let mut subtree = Vec::with_capacity(descendants.len() + 1);
    subtree.push(key);
    subtree.extend(descendants);
    subtree
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub key: String,
    pub kind: String,
    pub entity_id: String,
    pub name: String,
    pub depth: usize,
    pub parent_id: Option<String>,
    pub is_expandable: bool,
    pub is_expanded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuCategory {
    pub id: String,
    pub name: String,
    pub order: i64,
    pub product_ids: Vec<String>,
}

impl MenuCategory {
    pub fn new(id: impl Into<String>, order: i64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            order,
            product_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLabel {
    pub id: String,
    pub name: String,
    pub order: i64,
    pub categories: Vec<MenuCategory>,
}

impl MenuLabel {
    pub fn new(id: impl Into<String>, order: i64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            order,
            categories: Vec::new(),
        }
    }

    pub fn with_categories(mut self, categories: Vec<MenuCategory>) -> Self {
        self.categories = categories;
        self
    }

    fn sorted_categories(&self) -> Vec<&MenuCategory> {
        let mut categories: Vec<&MenuCategory> = self.categories.iter().collect();
        categories.sort_by_key(|c| c.order);
        categories
    }
}

/// Labels → categories menu data. Products hang off categories but are only
/// shown in the per-category view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuTree {
    pub labels: Vec<MenuLabel>,
}

impl MenuTree {
    pub fn new(labels: Vec<MenuLabel>) -> Self {
        Self { labels }
    }

    fn sorted_labels(&self) -> Vec<&MenuLabel> {
        let mut labels: Vec<&MenuLabel> = self.labels.iter().collect();
        labels.sort_by_key(|l| l.order);
        labels
    }

    /// Two-level nodes sorted by `order`. Labels accept category drops even
    /// when empty; categories are leaves here.
    pub fn nodes(&self) -> Vec<TreeNode> {
        self.sorted_labels()
            .into_iter()
            .map(|label| {
                let children = label
                    .sorted_categories()
                    .into_iter()
                    .map(|c| TreeNode::new(CATEGORY_KIND, &c.id).with_name(&c.name))
                    .collect();
                TreeNode::new(LABEL_KIND, &label.id)
                    .with_name(&label.name)
                    .with_contains(CATEGORY_KIND)
                    .with_children(children)
            })
            .collect()
    }

    pub fn rows(&self, expanded: &impl ExpandState) -> (Vec<FlatRow>, IdentityRegistry) {
        TreeNode::rows(&self.nodes(), expanded)
    }

    pub fn labels_registry(&self) -> IdentityRegistry {
        IdentityRegistry::flat(LABEL_KIND, self.sorted_labels().into_iter().map(|l| l.id.clone()))
    }

    /// Flat registry of one label's categories. Empty for an unknown label.
    pub fn categories_registry(&self, label_id: &str) -> IdentityRegistry {
        let ids = self
            .label(label_id)
            .map(|l| l.sorted_categories().into_iter().map(|c| c.id.clone()).collect::<Vec<_>>())
            .unwrap_or_default();
        IdentityRegistry::flat(CATEGORY_KIND, ids)
    }

    /// Flat registry of one category's products, taken from the first label
    /// holding that category.
    pub fn products_registry(&self, category_id: &str) -> IdentityRegistry {
        let ids = self
            .labels
            .iter()
            .flat_map(|l| l.categories.iter())
            .find(|c| c.id == category_id)
            .map(|c| c.product_ids.clone())
            .unwrap_or_default();
        IdentityRegistry::flat(PRODUCT_KIND, ids)
    }

    pub fn label(&self, label_id: &str) -> Option<&MenuLabel> {
        self.labels.iter().find(|l| l.id == label_id)
    }

    fn label_mut(&mut self, label_id: &str) -> Option<&mut MenuLabel> {
        self.labels.iter_mut().find(|l| l.id == label_id)
    }

    pub fn label_order(&self) -> Vec<String> {
        self.sorted_labels().into_iter().map(|l| l.id.clone()).collect()
    }

    pub fn category_order(&self, label_id: &str) -> Vec<String> {
        self.label(label_id)
            .map(|l| l.sorted_categories().into_iter().map(|c| c.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Rewrites label `order` fields to match `ids`. Unknown ids are ignored;
    /// labels missing from `ids` keep their relative order after the listed
    /// ones.
    pub fn reorder_labels(&mut self, ids: &[String]) {
        let unlisted: Vec<String> = self
            .label_order()
            .into_iter()
            .filter(|id| !ids.contains(id))
            .collect();
        for (order, id) in ids.iter().chain(unlisted.iter()).enumerate() {
            if let Some(label) = self.label_mut(id) {
                label.order = order as i64;
            }
        }
    }

    pub fn reorder_categories(&mut self, label_id: &str, ids: &[String]) -> bool {
        let current = self.category_order(label_id);
        let Some(label) = self.label_mut(label_id) else {
            return false;
        };
        let unlisted = current.iter().filter(|id| !ids.contains(id));
        for (order, id) in ids.iter().chain(unlisted).enumerate() {
            if let Some(category) = label.categories.iter_mut().find(|c| &c.id == id) {
                category.order = order as i64;
            }
        }
        true
    }

    /// Moves a category between labels, appending it at the destination.
    pub fn move_category(&mut self, category_id: &str, from: &str, to: &str) -> bool {
        if self.label(to).is_none() {
            return false;
        }
        let Some(source) = self.label_mut(from) else {
            return false;
        };
        let Some(pos) = source.categories.iter().position(|c| c.id == category_id) else {
            return false;
        };
        let mut category = source.categories.remove(pos);
        let Some(dest) = self.label_mut(to) else {
            return false;
        };
        category.order = dest.categories.iter().map(|c| c.order).max().map_or(0, |m| m + 1);
        dest.categories.push(category);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::{AllExpanded, ExpandedSet};

    fn tree() -> MenuTree {
        MenuTree::new(vec![
            MenuLabel::new("L2", 1).with_categories(vec![MenuCategory::new("C3", 0)]),
            MenuLabel::new("L1", 0).with_categories(vec![
                MenuCategory::new("C2", 1),
                MenuCategory::new("C1", 0),
            ]),
        ])
    }

    #[test]
    fn rows_and_registry_share_order() {
        let (rows, registry) = tree().rows(&AllExpanded);
        let row_keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(
            row_keys,
            vec![
                "label:L1",
                "category:L1~C1",
                "category:L1~C2",
                "label:L2",
                "category:L2~C3"
            ]
        );
        assert_eq!(registry.all_keys(), row_keys.as_slice());
        assert_eq!(rows[1].parent_id.as_deref(), Some("L1"));
        assert!(rows[0].is_expanded);
    }

    #[test]
    fn collapsed_children_are_registered_but_not_visible() {
        let mut expanded = ExpandedSet::new();
        expanded.expand("L2");
        let (rows, registry) = tree().rows(&expanded);
        assert_eq!(rows.len(), 3);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("category:L1~C1"));
        assert_eq!(registry.index_of("category:L1~C1"), None);
        assert_eq!(
            registry.child_keys("label:L1"),
            ["category:L1~C1", "category:L1~C2"]
        );
        assert_eq!(registry.child_entity_ids("label:L1"), ["C1", "C2"]);
    }

    #[test]
    fn identities_link_parent_and_child() {
        let (_, registry) = tree().rows(&AllExpanded);
        let child = registry.get("category:L1~C2").unwrap();
        assert_eq!(child.parent_key.as_deref(), Some("label:L1"));
        assert_eq!(child.depth, registry.depth("label:L1") + 1);
        assert!(registry.can_receive_drop("label:L1", CATEGORY_KIND));
        assert!(!registry.can_receive_drop("category:L1~C1", CATEGORY_KIND));
        assert_eq!(registry.root_entity_ids(LABEL_KIND), ["L1", "L2"]);
    }

    #[test]
    fn empty_label_still_accepts_categories() {
        let tree = MenuTree::new(vec![MenuLabel::new("L1", 0)]);
        let (_, registry) = tree.rows(&AllExpanded);
        assert!(!registry.is_expandable("label:L1"));
        assert!(registry.can_receive_drop("label:L1", CATEGORY_KIND));
    }

    #[test]
    fn three_level_descendants_are_preorder() {
        let roots = vec![
            TreeNode::new(LABEL_KIND, "L1").with_children(vec![
                TreeNode::new(CATEGORY_KIND, "C1")
                    .with_children(vec![TreeNode::new(PRODUCT_KIND, "P1")]),
                TreeNode::new(CATEGORY_KIND, "C2"),
            ]),
        ];
        let (_, registry) = TreeNode::rows(&roots, &AllExpanded);
        assert_eq!(
            registry.descendants("label:L1"),
            ["category:L1~C1", "product:L1~C1~P1", "category:L1~C2"]
        );
        assert_eq!(
            registry.direct_child_keys("label:L1"),
            vec!["category:L1~C1", "category:L1~C2"]
        );
        assert_eq!(registry.depth("product:L1~C1~P1"), 2);
    }

    #[test]
    fn mutations_rewrite_order() {
        let mut tree = tree();
        tree.reorder_labels(&["L2".to_string(), "L1".to_string()]);
        assert_eq!(tree.label_order(), ["L2", "L1"]);

        assert!(tree.reorder_categories("L1", &["C2".to_string(), "C1".to_string()]));
        assert_eq!(tree.category_order("L1"), ["C2", "C1"]);

        assert!(tree.move_category("C2", "L1", "L2"));
        assert_eq!(tree.category_order("L1"), ["C1"]);
        assert_eq!(tree.category_order("L2"), ["C3", "C2"]);
        assert!(!tree.move_category("C2", "L1", "L2"));
    }

    #[test]
    fn flat_registries_per_view() {
        let mut tree = tree();
        tree.labels[1].categories[0].product_ids = vec!["P1".into(), "P2".into()];
        assert_eq!(tree.labels_registry().all_keys(), ["label:L1", "label:L2"]);
        assert_eq!(
            tree.categories_registry("L1").all_keys(),
            ["category:C1", "category:C2"]
        );
        assert_eq!(
            tree.products_registry("C2").all_keys(),
            ["product:P1", "product:P2"]
        );
        assert!(tree.categories_registry("nope").is_empty());
    }
}
