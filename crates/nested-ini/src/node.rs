//! Core data model for parsed configuration trees.
//!
//! A parsed INI file is a [`Collection`]: an ordered map whose keys are either
//! auto-assigned integers (from `key[] = value` appends) or names. Arrays and
//! maps share this one type because an array may later acquire named keys
//! (`array.newKey = value`).

use indexmap::IndexMap;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt::{self, Write};

/// A key in a [`Collection`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Integer key, either auto-assigned by an append or written as a
    /// canonical decimal integer in the source.
    Index(i64),

    /// Any other key.
    Name(String),
}

impl Key {
    /// Normalize a textual key.
    ///
    /// Strings in canonical decimal form (`"0"`, `"12"`, `"-3"`, but not
    /// `"03"`, `"+3"` or `"-0"`) become [`Key::Index`]; everything else is a
    /// [`Key::Name`].
    pub fn parse(text: &str) -> Key {
        match parse_canonical_integer(text) {
            Some(index) => Key::Index(index),
            None => Key::Name(text.to_string()),
        }
    }

    /// The key rendered as text.
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            Key::Index(index) => Cow::Owned(index.to_string()),
            Key::Name(name) => Cow::Borrowed(name),
        }
    }

    /// Get the index if this is an integer key.
    pub fn as_index(&self) -> Option<i64> {
        match self {
            Key::Index(index) => Some(*index),
            Key::Name(_) => None,
        }
    }
}

/// Parse `text` as an `i64` only when it is written exactly the way the
/// integer would print.
pub(crate) fn parse_canonical_integer(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    if text == "-0" {
        return None;
    }
    text.parse().ok()
}

impl From<&str> for Key {
    fn from(text: &str) -> Self {
        Key::parse(text)
    }
}

impl From<String> for Key {
    fn from(text: String) -> Self {
        match parse_canonical_integer(&text) {
            Some(index) => Key::Index(index),
            None => Key::Name(text),
        }
    }
}

impl From<i64> for Key {
    fn from(index: i64) -> Self {
        Key::Index(index)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(index) => write!(f, "{}", index),
            Key::Name(name) => f.write_str(name),
        }
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Key::Index(index) => serializer.serialize_i64(*index),
            Key::Name(name) => serializer.serialize_str(name),
        }
    }
}

/// A leaf value.
///
/// `Normal` and `Raw` scanner modes only ever produce [`Scalar::String`];
/// `Typed` mode also produces integers, booleans and nulls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    String(String),
    Integer(i64),
    Boolean(bool),
    Null,
}

impl Scalar {
    /// Get the string if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => write!(f, "{:?}", s),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Boolean(b) => write!(f, "{}", b),
            Scalar::Null => f.write_str("null"),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::String(s) => serializer.serialize_str(s),
            Scalar::Integer(i) => serializer.serialize_i64(*i),
            Scalar::Boolean(b) => serializer.serialize_bool(*b),
            Scalar::Null => serializer.serialize_unit(),
        }
    }
}

/// A node in the configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigNode {
    Scalar(Scalar),
    Collection(Collection),
}

impl ConfigNode {
    /// Shorthand for a string scalar node.
    pub fn string(s: impl Into<String>) -> Self {
        ConfigNode::Scalar(Scalar::String(s.into()))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, ConfigNode::Collection(_))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            ConfigNode::Scalar(scalar) => Some(scalar),
            ConfigNode::Collection(_) => None,
        }
    }

    /// Get the string value if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            ConfigNode::Collection(collection) => Some(collection),
            ConfigNode::Scalar(_) => None,
        }
    }

    pub fn as_collection_mut(&mut self) -> Option<&mut Collection> {
        match self {
            ConfigNode::Collection(collection) => Some(collection),
            ConfigNode::Scalar(_) => None,
        }
    }
}

impl From<Scalar> for ConfigNode {
    fn from(scalar: Scalar) -> Self {
        ConfigNode::Scalar(scalar)
    }
}

impl From<Collection> for ConfigNode {
    fn from(collection: Collection) -> Self {
        ConfigNode::Collection(collection)
    }
}

impl From<&str> for ConfigNode {
    fn from(s: &str) -> Self {
        ConfigNode::string(s)
    }
}

impl Serialize for ConfigNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConfigNode::Scalar(scalar) => scalar.serialize(serializer),
            ConfigNode::Collection(collection) => collection.serialize(serializer),
        }
    }
}

/// Deepest collection nesting [`Serialize`] will write.
///
/// Serializers recurse once per level, so a deeper tree is reported as a
/// serialization error instead of exhausting the stack.
pub const MAX_SERIALIZE_DEPTH: usize = 256;

/// Ordered keyed collection: the unified array/map of the configuration tree.
///
/// Insertion order is preserved. Overwriting an existing key keeps its
/// position; removal shifts later entries down.
///
/// Dropping and [`dump`](Self::dump)ing a collection use an explicit stack,
/// so trees of any depth are safe to hold.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    entries: IndexMap<Key, ConfigNode>,

    /// One past the largest non-negative integer key ever inserted.
    /// `i64::MAX as u64 + 1` once `i64::MAX` has been used.
    next_index: u64,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The index the next [`push`](Self::push) will use.
    ///
    /// One more than the largest integer key inserted so far, or `0` when
    /// there was no non-negative integer key. `None` once `i64::MAX` is
    /// taken. Removing keys does not lower it.
    pub fn next_index(&self) -> Option<i64> {
        i64::try_from(self.next_index).ok()
    }

    /// Append a value under the next free integer key, returning that key.
    ///
    /// When the integer key space is exhausted the value is dropped and
    /// `None` is returned.
    pub fn push(&mut self, value: impl Into<ConfigNode>) -> Option<Key> {
        let Some(index) = self.next_index() else {
            tracing::warn!(
                len = self.len(),
                "cannot append: next element index is already in use"
            );
            return None;
        };
        let key = Key::Index(index);
        self.insert(key.clone(), value);
        Some(key)
    }

    /// Set a key, returning the previous value. An existing key keeps its
    /// position.
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<ConfigNode>) -> Option<ConfigNode> {
        let key = key.into();
        self.claim_index(&key);
        self.entries.insert(key, value.into())
    }

    fn claim_index(&mut self, key: &Key) {
        if let Some(index) = key.as_index().and_then(|i| u64::try_from(i).ok()) {
            self.next_index = self.next_index.max(index + 1);
        }
    }

    pub fn get(&self, key: &Key) -> Option<&ConfigNode> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &Key) -> Option<&mut ConfigNode> {
        self.entries.get_mut(key)
    }

    /// Look up a value by textual key (normalized with [`Key::parse`]).
    pub fn get_str(&self, key: &str) -> Option<&ConfigNode> {
        self.entries.get(&Key::parse(key))
    }

    /// Follow a path of textual keys through nested collections.
    pub fn get_path(&self, path: &[&str]) -> Option<&ConfigNode> {
        let (first, rest) = path.split_first()?;
        let mut current = self.get_str(first)?;
        for segment in rest {
            current = current.as_collection()?.get_str(segment)?;
        }
        Some(current)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &Key) -> Option<ConfigNode> {
        self.entries.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &ConfigNode)> {
        self.entries.iter()
    }

    /// The collection at `key`, replacing a missing or scalar value with a
    /// fresh empty collection.
    pub(crate) fn child_collection_mut(&mut self, key: Key) -> &mut Collection {
        self.claim_index(&key);
        let slot = self
            .entries
            .entry(key)
            .or_insert_with(|| ConfigNode::Collection(Collection::new()));
        if !slot.is_collection() {
            *slot = ConfigNode::Collection(Collection::new());
        }
        match slot {
            ConfigNode::Collection(collection) => collection,
            ConfigNode::Scalar(_) => unreachable!("slot was just replaced with a collection"),
        }
    }

    /// True when the keys are exactly `0, 1, ..., len - 1` in order.
    ///
    /// Such collections serialize as sequences.
    pub fn is_list(&self) -> bool {
        self.entries
            .keys()
            .enumerate()
            .all(|(position, key)| matches!(key, Key::Index(i) if usize::try_from(*i) == Ok(position)))
    }

    /// Render the tree as indented text, one entry per line.
    ///
    /// ```text
    /// section:
    ///   key: "value"
    ///   list:
    ///     0: "a"
    /// ```
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![self.entries.iter()];
        while let Some(entries) = stack.last_mut() {
            let Some((key, value)) = entries.next() else {
                stack.pop();
                continue;
            };
            let indent = "  ".repeat(stack.len() - 1);
            match value {
                ConfigNode::Scalar(scalar) => {
                    let _ = writeln!(out, "{}{}: {}", indent, key, scalar);
                }
                ConfigNode::Collection(child) => {
                    let _ = writeln!(out, "{}{}:", indent, key);
                    stack.push(child.entries.iter());
                }
            }
        }
        out
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Drop for Collection {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        drain_children(&mut self.entries, &mut pending);
        while let Some(mut collection) = pending.pop() {
            drain_children(&mut collection.entries, &mut pending);
        }
    }
}

/// Empty `entries`, moving child collections onto `pending`.
fn drain_children(entries: &mut IndexMap<Key, ConfigNode>, pending: &mut Vec<Collection>) {
    for (_, node) in entries.drain(..) {
        if let ConfigNode::Collection(child) = node {
            pending.push(child);
        }
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = (&'a Key, &'a ConfigNode);
    type IntoIter = indexmap::map::Iter<'a, Key, ConfigNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Collection {
    type Item = (Key, ConfigNode);
    type IntoIter = indexmap::map::IntoIter<Key, ConfigNode>;

    fn into_iter(mut self) -> Self::IntoIter {
        std::mem::take(&mut self.entries).into_iter()
    }
}

impl<K: Into<Key>, V: Into<ConfigNode>> FromIterator<(K, V)> for Collection {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut collection = Collection::new();
        for (key, value) in iter {
            collection.insert(key, value);
        }
        collection
    }
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Bounded {
            collection: self,
            depth: 1,
        }
        .serialize(serializer)
    }
}

/// A collection being serialized `depth` levels below the outermost one.
struct Bounded<'a> {
    collection: &'a Collection,
    depth: usize,
}

impl Bounded<'_> {
    fn child<'c>(&self, node: &'c ConfigNode) -> BoundedNode<'c> {
        match node {
            ConfigNode::Scalar(scalar) => BoundedNode::Scalar(scalar),
            ConfigNode::Collection(collection) => BoundedNode::Collection(Bounded {
                collection,
                depth: self.depth + 1,
            }),
        }
    }
}

enum BoundedNode<'a> {
    Scalar(&'a Scalar),
    Collection(Bounded<'a>),
}

impl Serialize for BoundedNode<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BoundedNode::Scalar(scalar) => scalar.serialize(serializer),
            BoundedNode::Collection(bounded) => bounded.serialize(serializer),
        }
    }
}

impl Serialize for Bounded<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.depth > MAX_SERIALIZE_DEPTH {
            return Err(S::Error::custom(format!(
                "collections nested deeper than {} levels cannot be serialized",
                MAX_SERIALIZE_DEPTH
            )));
        }
        let collection = self.collection;
        if collection.is_list() && !collection.is_empty() {
            let mut seq = serializer.serialize_seq(Some(collection.len()))?;
            for value in collection.entries.values() {
                seq.serialize_element(&self.child(value))?;
            }
            seq.end()
        } else {
            let mut map = serializer.serialize_map(Some(collection.len()))?;
            for (key, value) in &collection.entries {
                map.serialize_entry(key, &self.child(value))?;
            }
            map.end()
        }
    }
}
