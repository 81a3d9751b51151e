//! Identity registry: flat key → row identity lookup.
//!
//! The registry is an immutable snapshot rebuilt whenever the underlying menu
//! data or the expanded set changes. Parent/child links are stored as keys,
//! never as references, so the whole structure is a plain arena keyed by
//! string.
//!
//! Lookups never fail. An unknown key yields `None`, `0`, or an empty slice,
//! because a live selection can briefly hold keys the latest snapshot no
//! longer knows about.

pub mod key;
pub mod tree;

use std::collections::{BTreeMap, HashMap};

pub use key::{
    CATEGORY_KIND, KeyError, KeySchema, LABEL_KIND, PRODUCT_KIND, ParsedKey, composite_of,
    create_key, entity_id_of, kind_of, parent_id_of, parse_key,
};
pub use tree::{FlatRow, MenuCategory, MenuLabel, MenuTree, TreeNode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIdentity {
    pub key: String,
    pub kind: String,
    pub entity_id: String,
    pub depth: usize,
    pub parent_key: Option<String>,
    /// Every descendant key, in visual (pre-order) order.
    pub child_keys: Vec<String>,
    pub is_expandable: bool,
    /// Kinds this row accepts as dropped children.
    pub contains_kinds: Vec<String>,
}

impl RowIdentity {
    pub fn new(kind: impl Into<String>, entity_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: kind.into(),
            entity_id: entity_id.into(),
            depth: 0,
            parent_key: None,
            child_keys: Vec::new(),
            is_expandable: false,
            contains_kinds: Vec::new(),
        }
    }

    pub fn can_receive(&self, kind: &str) -> bool {
        self.contains_kinds.iter().any(|k| k == kind)
    }
}

#[derive(Debug, Clone, Default)]
pub struct IdentityRegistry {
    by_key: HashMap<String, RowIdentity>,
    all_keys: Vec<String>,
    position: HashMap<String, usize>,
    keys_by_kind: BTreeMap<String, Vec<String>>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Depth-0 registry for flat tables (all labels, all categories, the
    /// products of one category).
    pub fn flat<I, S>(kind: &str, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for id in ids {
            let id = id.into();
            let key = create_key(kind, [id.as_str()]);
            registry.insert(RowIdentity::new(kind, id, key), true);
        }
        registry
    }

    /// Adds an identity. Only `visible` identities take part in the visual
    /// order; hidden ones (collapsed descendants) are still resolvable.
    pub(crate) fn insert(&mut self, identity: RowIdentity, visible: bool) {
        if visible {
            self.position.insert(identity.key.clone(), self.all_keys.len());
            self.all_keys.push(identity.key.clone());
        }
        self.keys_by_kind
            .entry(identity.kind.clone())
            .or_default()
            .push(identity.key.clone());
        self.by_key.insert(identity.key.clone(), identity);
    }

    pub fn get(&self, key: &str) -> Option<&RowIdentity> {
        self.by_key.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Visible keys in rendered row order.
    pub fn all_keys(&self) -> &[String] {
        &self.all_keys
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.position.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.all_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_keys.is_empty()
    }

    pub fn keys_of_kind(&self, kind: &str) -> &[String] {
        self.keys_by_kind.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn entity_id(&self, key: &str) -> Option<&str> {
        self.get(key).map(|i| i.entity_id.as_str())
    }

    pub fn kind(&self, key: &str) -> Option<&str> {
        self.get(key).map(|i| i.kind.as_str())
    }

    pub fn depth(&self, key: &str) -> usize {
        self.get(key).map(|i| i.depth).unwrap_or(0)
    }

    pub fn parent_key(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|i| i.parent_key.as_deref())
    }

    pub fn child_keys(&self, key: &str) -> &[String] {
        self.get(key).map(|i| i.child_keys.as_slice()).unwrap_or(&[])
    }

    /// Transitive descendants in visual order.
    pub fn descendants(&self, key: &str) -> &[String] {
        self.child_keys(key)
    }

    /// Immediate children only.
    pub fn direct_child_keys(&self, key: &str) -> Vec<&str> {
        let Some(identity) = self.get(key) else {
            return Vec::new();
        };
        identity
            .child_keys
            .iter()
            .filter(|child| self.get(child).map(|c| c.depth) == Some(identity.depth + 1))
            .map(String::as_str)
            .collect()
    }

    pub fn is_expandable(&self, key: &str) -> bool {
        self.get(key).map(|i| i.is_expandable).unwrap_or(false)
    }

    pub fn contains_kinds(&self, key: &str) -> &[String] {
        self.get(key)
            .map(|i| i.contains_kinds.as_slice())
            .unwrap_or(&[])
    }

    /// The only drop-legality primitive: does `target` accept `drag_kind`?
    pub fn can_receive_drop(&self, target: &str, drag_kind: &str) -> bool {
        self.get(target)
            .map(|i| i.can_receive(drag_kind))
            .unwrap_or(false)
    }

    /// Entity ids of a parent's direct children, in order. Includes children
    /// hidden under a collapsed parent.
    pub fn child_entity_ids(&self, key: &str) -> Vec<String> {
        self.direct_child_keys(key)
            .into_iter()
            .filter_map(|child| self.entity_id(child))
            .map(str::to_string)
            .collect()
    }

    /// Entity ids of the depth-0 rows of `kind`, in order.
    pub fn root_entity_ids(&self, kind: &str) -> Vec<String> {
        self.keys_of_kind(kind)
            .iter()
            .filter_map(|key| self.get(key))
            .filter(|identity| identity.depth == 0)
            .map(|identity| identity.entity_id.clone())
            .collect()
    }

    /// Key of the row with this kind and entity id, if present.
    pub fn key_for(&self, kind: &str, entity_id: &str) -> Option<&str> {
        self.keys_of_kind(kind)
            .iter()
            .find(|key| self.entity_id(key) == Some(entity_id))
            .map(String::as_str)
    }
}
