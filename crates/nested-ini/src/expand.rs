//! Expansion of delimited keys into nested collections.
//!
//! The tokenizer only understands one level of sections, so a key such as
//! `subsection.arg.foo` arrives as a single flat key. Expansion splits it on
//! the delimiter, walks (creating as needed) `subsection` then `arg`, and
//! stores the value under `foo`. A section named `section.subsection` is
//! just a delimited key at the top level whose value is a collection; when it
//! lands on an existing collection the two are merged.
//!
//! # Traversal
//!
//! The walk is depth-first and visits keys in exactly the order a recursive
//! formulation would, but keeps its position in an explicit stack of
//! [`Frame`]s. Input like `a.a.a.…` with many thousands of segments produces
//! a tree that deep without growing the native call stack.

use crate::merge::merge_nodes;
use crate::node::{Collection, ConfigNode, Key, Scalar};
use crate::options::Delimiter;

/// One collection being expanded.
#[derive(Debug)]
struct Frame {
    /// Path from the root collection to this one.
    path: Vec<Key>,

    /// Keys of the collection taken before any of them was expanded.
    keys: Vec<Key>,

    /// Position of the next key in `keys`.
    next: usize,
}

impl Frame {
    fn new(path: Vec<Key>, collection: &Collection) -> Self {
        Frame {
            path,
            keys: collection.keys().cloned().collect(),
            next: 0,
        }
    }
}

/// Expand every delimited key in `root`, at every depth, in place.
///
/// For each key containing `delimiter`:
///
/// 1. the entry is removed;
/// 2. the key is split into path segments and a leaf key;
/// 3. the path is walked from the current collection, replacing missing or
///    scalar values with empty collections;
/// 4. the value is stored under the leaf key, merged with
///    [`merge_nodes`](crate::merge_nodes) into any existing value;
/// 5. the stored value is expanded in turn.
///
/// Keys without the delimiter are left in place and their collection values
/// expanded. Never fails; running it on an already expanded tree changes
/// nothing.
pub fn expand(root: &mut Collection, delimiter: &Delimiter) {
    let mut stack = vec![Frame::new(Vec::new(), root)];
    let mut expanded = 0usize;
    let mut max_depth = 0usize;

    while let Some(frame) = stack.last_mut() {
        let Some(key) = frame.keys.get(frame.next).cloned() else {
            stack.pop();
            continue;
        };
        frame.next += 1;

        let Some(current) = collection_at_mut(root, &frame.path) else {
            stack.pop();
            continue;
        };

        let descend = if key_contains(&key, delimiter) {
            expanded += 1;
            expand_delimited_key(current, key, delimiter, frame.path.len())
        } else {
            current
                .get(&key)
                .and_then(ConfigNode::as_collection)
                .map(|child| (vec![key], child.keys().cloned().collect()))
        };

        if let Some((relative, keys)) = descend {
            let mut path = frame.path.clone();
            path.extend(relative);
            max_depth = max_depth.max(path.len());
            stack.push(Frame { path, keys, next: 0 });
        }
    }

    tracing::debug!(
        expanded,
        max_depth,
        delimiter = delimiter.as_str(),
        "expanded delimited keys"
    );
}

/// Expand `node` if it is a collection. Scalars are left untouched.
pub fn expand_node(node: &mut ConfigNode, delimiter: &Delimiter) {
    if let ConfigNode::Collection(collection) = node {
        expand(collection, delimiter);
    }
}

fn key_contains(key: &Key, delimiter: &Delimiter) -> bool {
    key.as_str().contains(delimiter.as_str())
}

/// Move the value stored under a delimited `key` to the path it encodes.
///
/// Returns the path (relative to `current`) and key snapshot of the stored
/// value when it is a collection that still has to be expanded.
fn expand_delimited_key(
    current: &mut Collection,
    key: Key,
    delimiter: &Delimiter,
    depth: usize,
) -> Option<(Vec<Key>, Vec<Key>)> {
    let mut segments: Vec<Key> = key
        .as_str()
        .split(delimiter.as_str())
        .map(Key::parse)
        .collect();
    let leaf = segments.pop()?;
    let value = current.remove(&key)?;

    tracing::trace!(%key, depth, segments = segments.len() + 1, "expanding key");

    let mut target = current;
    for segment in &segments {
        target = target.child_collection_mut(segment.clone());
    }

    match target.get_mut(&leaf) {
        Some(existing) => {
            let previous = std::mem::replace(existing, ConfigNode::Scalar(Scalar::Null));
            *existing = merge_nodes(previous, value);
        }
        None => {
            target.insert(leaf.clone(), value);
        }
    }

    let stored = target.get(&leaf)?.as_collection()?;
    let keys = stored.keys().cloned().collect();
    segments.push(leaf);
    Some((segments, keys))
}

/// Follow `path` from `root` through nested collections.
fn collection_at_mut<'a>(root: &'a mut Collection, path: &[Key]) -> Option<&'a mut Collection> {
    let mut current = root;
    for key in path {
        current = current.get_mut(key)?.as_collection_mut()?;
    }
    Some(current)
}
