//! Recursive merge of two collections.
//!
//! Used by the expander when a delimited key lands on a path that already
//! holds a collection, e.g. `[section.subsection]` after `[section]` declared
//! `subsection.arg = ...`.

use crate::node::{Collection, ConfigNode};

/// Merge `right` into `left`.
///
/// - Keys only present in `right` are appended after `left`'s keys, in
///   `right`'s order.
/// - Keys present in both where both values are collections are merged
///   recursively.
/// - Any other collision is won by `right`; the key keeps its position in
///   `left`.
///
/// Integer keys are matched like any other key and never renumbered, so
/// `{0: a, 1: b} ⊕ {1: c}` is `{0: a, 1: c}`.
pub fn merge(left: &mut Collection, right: Collection) {
    for (key, right_value) in right {
        let right_child = match right_value {
            ConfigNode::Collection(right_child) => right_child,
            scalar => {
                left.insert(key, scalar);
                continue;
            }
        };
        if let Some(ConfigNode::Collection(left_child)) = left.get_mut(&key) {
            merge(left_child, right_child);
            continue;
        }
        left.insert(key, right_child);
    }
}

/// Merge two values, returning the result.
///
/// Collections merge with [`merge`]; otherwise `right` replaces `left`.
pub fn merge_nodes(left: ConfigNode, right: ConfigNode) -> ConfigNode {
    match (left, right) {
        (ConfigNode::Collection(mut left), ConfigNode::Collection(right)) => {
            merge(&mut left, right);
            ConfigNode::Collection(left)
        }
        (_, right) => right,
    }
}
