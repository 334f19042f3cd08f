use std::collections::HashMap;

use crate::model::Block;
use crate::node::{Node, NodeKey, WeakNode};

/// Blocks already derived from container nodes, keyed by node identity.
///
/// Entries hold only weak handles, so the cache never keeps a node alive. A
/// key is trusted only while its weak handle still upgrades to the very same
/// node, which guards against address reuse after a node is dropped.
#[derive(Debug, Default)]
pub struct BlockCache {
    entries: HashMap<NodeKey, (WeakNode, Block)>,
}

impl BlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: &Node) -> Option<&Block> {
        let (weak, block) = self.entries.get(&node.key())?;
        let alive = weak.upgrade()?;
        alive.ptr_eq(node).then_some(block)
    }

    pub fn insert(&mut self, node: &Node, block: Block) {
        self.entries.insert(node.key(), (node.downgrade(), block));
    }

    /// Drops the entry for `node`, if any.
    pub fn evict(&mut self, node: &Node) -> Option<Block> {
        self.entries.remove(&node.key()).map(|(_, block)| block)
    }

    /// Drops every entry whose node no longer exists. Returns how many went.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, (weak, _)| weak.is_alive());
        let pruned = before - self.entries.len();
        if pruned > 0 {
            log::trace!("pruned {pruned} dead block cache entries");
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Attrs;
    use crate::schema::Props;

    fn block(id: &str) -> Block {
        Block {
            id: id.into(),
            block_type: "paragraph".into(),
            props: Props::new(),
            content: None,
            children: vec![],
        }
    }

    #[test]
    fn test_hit_requires_the_same_live_node() {
        let mut cache = BlockCache::new();
        let node = Node::new("blockContainer", Attrs::new(), vec![]);
        let twin = Node::new("blockContainer", Attrs::new(), vec![]);
        cache.insert(&node, block("a"));

        assert_eq!(cache.get(&node).map(|b| b.id.as_str()), Some("a"));
        assert!(cache.get(&twin).is_none());
    }

    #[test]
    fn test_prune_drops_dead_nodes_only() {
        let mut cache = BlockCache::new();
        let kept = Node::new("blockContainer", Attrs::new(), vec![]);
        let dropped = Node::new("blockContainer", Attrs::new(), vec![]);
        cache.insert(&kept, block("kept"));
        cache.insert(&dropped, block("dropped"));
        drop(dropped);

        assert_eq!(cache.prune(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&kept).is_some());
    }

    #[test]
    fn test_evict() {
        let mut cache = BlockCache::new();
        let node = Node::new("blockContainer", Attrs::new(), vec![]);
        cache.insert(&node, block("a"));
        assert_eq!(cache.evict(&node).map(|b| b.id), Some("a".to_string()));
        assert!(cache.is_empty());
    }
}
