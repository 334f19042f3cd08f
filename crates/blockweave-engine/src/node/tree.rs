//! Path-based navigation and persistent rebuilds of the node tree.
//!
//! A path is the list of child indices leading from the root to a node.

use std::ops::Range;

use super::{BLOCK_CONTAINER, BLOCK_GROUP, Node};
use crate::error::{BlockError, Result};

/// Node at `path` below `root`.
pub fn node_at<'a>(root: &'a Node, path: &[usize]) -> Option<&'a Node> {
    let mut current = root;
    for &idx in path {
        current = current.child(idx)?;
    }
    Some(current)
}

/// Path to the `blockContainer` whose `id` attr equals `id`.
pub fn find_container(root: &Node, id: &str) -> Option<Vec<usize>> {
    if root.type_name() == BLOCK_CONTAINER
        && root.attr("id").and_then(|v| v.as_str()) == Some(id)
    {
        return Some(Vec::new());
    }
    for (idx, child) in root.content().iter().enumerate() {
        if child.is_text() {
            continue;
        }
        if let Some(mut path) = find_container(child, id) {
            path.insert(0, idx);
            return Some(path);
        }
    }
    None
}

/// Path to `target`, compared by identity.
pub fn find_node(root: &Node, target: &Node) -> Option<Vec<usize>> {
    if root.ptr_eq(target) {
        return Some(Vec::new());
    }
    root.content().iter().enumerate().find_map(|(idx, child)| {
        let mut path = find_node(child, target)?;
        path.insert(0, idx);
        Some(path)
    })
}

/// Every container in document order, parents before their children.
pub fn containers(root: &Node) -> Vec<Node> {
    let mut out = Vec::new();
    collect_containers(root, &mut out);
    out
}

fn collect_containers(node: &Node, out: &mut Vec<Node>) {
    if node.type_name() == BLOCK_CONTAINER {
        out.push(node.clone());
    }
    for child in node.content() {
        if matches!(child.type_name(), BLOCK_GROUP | BLOCK_CONTAINER) {
            collect_containers(child, out);
        }
    }
}

/// Rebuilds `root` with `replacement` substituted for the children in `range`
/// of the node at `parent`. Everything off the path stays shared.
pub fn splice(
    root: &Node,
    parent: &[usize],
    range: Range<usize>,
    replacement: Vec<Node>,
) -> Result<Node> {
    match parent.split_first() {
        None => {
            if range.end > root.child_count() || range.start > range.end {
                return Err(BlockError::MalformedNode(format!(
                    "splice range {range:?} out of bounds for `{}` with {} children",
                    root.type_name(),
                    root.child_count()
                )));
            }
            let mut content = root.content().to_vec();
            content.splice(range, replacement);
            Ok(root.with_content(content))
        }
        Some((&idx, rest)) => {
            let child = root.child(idx).ok_or_else(|| {
                BlockError::MalformedNode(format!("no child {idx} in `{}`", root.type_name()))
            })?;
            let rebuilt = splice(child, rest, range, replacement)?;
            let mut content = root.content().to_vec();
            content[idx] = rebuilt;
            Ok(root.with_content(content))
        }
    }
}

/// Rebuilds `root` with the node at `path` replaced.
pub fn replace_at(root: &Node, path: &[usize], replacement: Node) -> Result<Node> {
    let Some((&last, parent)) = path.split_last() else {
        return Ok(replacement);
    };
    splice(root, parent, last..last + 1, vec![replacement])
}
