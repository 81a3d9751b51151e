//! Structural key helpers.
//!
//! A key is `{kind}:{compositeId}` where the composite id is the path of
//! entity ids from the root, joined by [`KEY_SEGMENT_SEPARATOR`]:
//!
//! - `label:L1`
//! - `category:L1~C1`
//! - `product:L1~C1~P1`
//!
//! Everything here is derived from the string alone and never consults a
//! registry. For keys present in a registry, [`KeySchema::parent_key_of`]
//! agrees with the registry's recorded parent key.

use thiserror::Error;

use crate::constants::{KEY_KIND_SEPARATOR, KEY_SEGMENT_SEPARATOR};

pub const LABEL_KIND: &str = "label";
pub const CATEGORY_KIND: &str = "category";
pub const PRODUCT_KIND: &str = "product";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("key `{0}` has no kind separator")]
    MissingKind(String),
    #[error("key `{0}` has an empty kind")]
    EmptyKind(String),
    #[error("key `{0}` has an empty id segment")]
    EmptySegment(String),
}

pub fn create_key<I, S>(kind: &str, ids: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut key = String::with_capacity(kind.len() + 16);
    key.push_str(kind);
    key.push(KEY_KIND_SEPARATOR);
    for (i, id) in ids.into_iter().enumerate() {
        if i > 0 {
            key.push(KEY_SEGMENT_SEPARATOR);
        }
        key.push_str(id.as_ref());
    }
    key
}

/// Kind prefix, or `""` when the key has no kind separator.
pub fn kind_of(key: &str) -> &str {
    key.split_once(KEY_KIND_SEPARATOR)
        .map(|(kind, _)| kind)
        .unwrap_or("")
}

/// Everything after the kind separator. A key without one is returned whole.
pub fn composite_of(key: &str) -> &str {
    key.split_once(KEY_KIND_SEPARATOR)
        .map(|(_, composite)| composite)
        .unwrap_or(key)
}

/// Last id segment of the composite.
pub fn entity_id_of(key: &str) -> &str {
    composite_of(key)
        .rsplit(KEY_SEGMENT_SEPARATOR)
        .next()
        .unwrap_or("")
}

/// Second-to-last id segment, i.e. the direct parent's entity id.
pub fn parent_id_of(key: &str) -> Option<&str> {
    let mut segments = composite_of(key).rsplit(KEY_SEGMENT_SEPARATOR);
    segments.next();
    segments.next()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    pub kind: String,
    pub segments: Vec<String>,
}

impl ParsedKey {
    pub fn entity_id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    pub fn parent_id(&self) -> Option<&str> {
        let len = self.segments.len();
        (len >= 2).then(|| self.segments[len - 2].as_str())
    }

    pub fn to_key(&self) -> String {
        create_key(&self.kind, &self.segments)
    }
}

pub fn parse_key(key: &str) -> Result<ParsedKey, KeyError> {
    let Some((kind, composite)) = key.split_once(KEY_KIND_SEPARATOR) else {
        return Err(KeyError::MissingKind(key.to_string()));
    };
    if kind.is_empty() {
        return Err(KeyError::EmptyKind(key.to_string()));
    }
    let segments: Vec<String> = composite
        .split(KEY_SEGMENT_SEPARATOR)
        .map(str::to_string)
        .collect();
    if segments.iter().any(String::is_empty) {
        return Err(KeyError::EmptySegment(key.to_string()));
    }
    Ok(ParsedKey {
        kind: kind.to_string(),
        segments,
    })
}

/// Ordered kinds by depth. Index 0 is the root kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    kinds: Vec<String>,
}

impl KeySchema {
    pub fn new<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kinds: kinds.into_iter().map(Into::into).collect(),
        }
    }

    pub fn menu() -> Self {
        Self::new([LABEL_KIND, CATEGORY_KIND, PRODUCT_KIND])
    }

    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }

    pub fn depth_of(&self, kind: &str) -> Option<usize> {
        self.kinds.iter().position(|k| k == kind)
    }

    pub fn child_kind_of(&self, kind: &str) -> Option<&str> {
        let depth = self.depth_of(kind)?;
        self.kinds.get(depth + 1).map(String::as_str)
    }

    /// Structural parent key. `None` for root kinds, unknown kinds, and
    /// composites too short to carry a parent.
    pub fn parent_key_of(&self, key: &str) -> Option<String> {
        let depth = self.depth_of(kind_of(key))?;
        if depth == 0 {
            return None;
        }
        let segments: Vec<&str> = composite_of(key).split(KEY_SEGMENT_SEPARATOR).collect();
        if segments.len() < 2 {
            return None;
        }
        let parent_kind = &self.kinds[depth - 1];
        Some(create_key(parent_kind, &segments[..segments.len() - 1]))
    }
}

impl Default for KeySchema {
    fn default() -> Self {
        Self::menu()
    }
}
