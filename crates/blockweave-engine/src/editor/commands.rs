//! Block-level edits, cursor and selection.
//!
//! Top-level containers sit at `[0, i]`: the `doc` root holds a single
//! `blockGroup`. A container's nested group, when present, is its child 1.

use std::collections::HashSet;

use super::Editor;
use crate::convert::{block_to_node, merge_partial_block};
use crate::error::{BlockError, Result};
use crate::model::{Block, PartialBlock};
use crate::node::{Attrs, BLOCK_GROUP, Node, tree};

/// Where inserted blocks go relative to the reference block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
    /// At the end of the reference block's children.
    Nested,
}

/// The selected blocks, outermost only: a selected block's children are
/// reached through it.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub blocks: Vec<Block>,
}

fn container_id(node: &Node) -> Option<&str> {
    node.attr("id").and_then(|id| id.as_str())
}

impl Editor {
    fn container_path(&self, id: &str) -> Result<Vec<usize>> {
        tree::find_container(&self.doc, id).ok_or_else(|| BlockError::BlockNotFound(id.to_string()))
    }

    pub(super) fn container(&self, id: &str) -> Result<Node> {
        let path = self.container_path(id)?;
        tree::node_at(&self.doc, &path)
            .cloned()
            .ok_or_else(|| BlockError::BlockNotFound(id.to_string()))
    }

    pub fn get_block(&self, id: &str) -> Result<Block> {
        self.block_for_node(&self.container(id)?)
    }

    /// Inserts `blocks` next to or inside the block `reference_id`.
    ///
    /// Fails without changing the document if any block is invalid or
    /// reuses an id already in the document.
    pub fn insert_blocks(
        &mut self,
        blocks: &[PartialBlock],
        reference_id: &str,
        placement: Placement,
    ) -> Result<Vec<Block>> {
        let nodes = self.nodes_for(blocks, &HashSet::new())?;
        let doc = insert_nodes(&self.doc, self.container_path(reference_id)?, nodes.clone(), placement)?;
        self.after_mutation(doc, "insert_blocks");
        nodes.iter().map(|node| self.block_for_node(node)).collect()
    }

    /// Applies `update` to the block `id`.
    ///
    /// Props merge over the current ones; content and children are only
    /// replaced when `update` supplies them.
    pub fn update_block(&mut self, id: &str, update: &PartialBlock) -> Result<Block> {
        let path = self.container_path(id)?;
        let old = self.container(id)?;
        let prior = self.block_for_node(&old)?;

        let mut merged = merge_partial_block(&prior, update, &self.registry)?;
        let keep_children = update.children.is_none();
        if keep_children {
            merged.children = None;
        } else if let Some(children) = &merged.children {
            let own: HashSet<String> = tree::containers(&old)
                .iter()
                .filter_map(|c| container_id(c).map(str::to_string))
                .collect();
            self.check_ids(children, &own)?;
        }

        let mut node = block_to_node(&merged, &self.registry)?;
        if keep_children && let Some(group) = old.child(1) {
            let mut content = node.content().to_vec();
            content.push(group.clone());
            node = node.with_content(content);
        }
        let doc = tree::replace_at(&self.doc, &path, node.clone())?;
        self.after_mutation(doc, "update_block");
        self.block_for_node(&node)
    }

    /// Removes the blocks `ids` with their children.
    ///
    /// Every id must exist. A document left empty gets one blank block.
    pub fn remove_blocks(&mut self, ids: &[&str]) -> Result<()> {
        let paths = self.removal_paths(ids)?;
        let doc = self.remove_paths(self.doc.clone(), &paths)?;
        self.after_mutation(doc, "remove_blocks");
        Ok(())
    }

    /// Inserts `replacements` where the first of `remove` was, then removes
    /// `remove`. Does nothing when `remove` is empty.
    ///
    /// A listed block inside another listed block is removed with it and is
    /// never the insertion point. Replacements may reuse the ids of the
    /// blocks they replace.
    pub fn replace_blocks(&mut self, remove: &[&str], replacements: &[PartialBlock]) -> Result<Vec<Block>> {
        if remove.is_empty() {
            return Ok(Vec::new());
        }
        let mut paths = self.removal_paths(remove)?;
        let mut freed = HashSet::new();
        for path in &paths {
            for container in tree::node_at(&self.doc, path).iter().flat_map(|c| tree::containers(c)) {
                freed.extend(container_id(&container).map(str::to_string));
            }
        }
        let anchor = remove
            .iter()
            .filter_map(|id| tree::find_container(&self.doc, id))
            .find(|path| paths.contains(path))
            .ok_or_else(|| BlockError::MalformedNode("no block left to replace".to_string()))?;
        let Some((&at, group_path)) = anchor.split_last() else {
            return Err(BlockError::MalformedNode("reference block is the root".to_string()));
        };

        let nodes = self.nodes_for(replacements, &freed)?;
        let doc = tree::splice(&self.doc, group_path, at..at, nodes.clone())?;
        shift_for_insert(&mut paths, group_path, at, nodes.len());
        let doc = self.remove_paths(doc, &paths)?;
        self.after_mutation(doc, "replace_blocks");
        nodes.iter().map(|node| self.block_for_node(node)).collect()
    }

    /// The block holding the text cursor.
    pub fn text_cursor_block(&self) -> Result<Block> {
        self.get_block(&self.text_cursor)
    }

    pub fn set_text_cursor(&mut self, id: &str) -> Result<()> {
        self.container_path(id)?;
        self.text_cursor = id.to_string();
        Ok(())
    }

    /// The selected blocks, or `None` when nothing is selected.
    pub fn selection(&self) -> Result<Option<Selection>> {
        let Some(ids) = &self.selection else {
            return Ok(None);
        };
        let blocks = ids
            .iter()
            .map(|id| self.get_block(id))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(Selection { blocks }))
    }

    /// Selects the blocks from `from_id` to `to_id` in document order.
    pub fn set_selection(&mut self, from_id: &str, to_id: &str) -> Result<()> {
        let containers = tree::containers(&self.doc);
        let position = |id: &str| {
            containers
                .iter()
                .position(|c| container_id(c) == Some(id))
                .ok_or_else(|| BlockError::BlockNotFound(id.to_string()))
        };
        let (from, to) = (position(from_id)?, position(to_id)?);
        let range = from.min(to)..=from.max(to);

        let mut selected: Vec<&Node> = Vec::new();
        for container in &containers[range] {
            let inside_selected = selected
                .iter()
                .any(|parent| tree::find_node(parent, container).is_some());
            if !inside_selected {
                selected.push(container);
            }
        }
        self.selection = Some(
            selected
                .iter()
                .filter_map(|c| container_id(c).map(str::to_string))
                .collect(),
        );
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Nodes for `blocks`, refusing ids already in the document unless in `freed`.
    fn nodes_for(&self, blocks: &[PartialBlock], freed: &HashSet<String>) -> Result<Vec<Node>> {
        self.check_ids(blocks, freed)?;
        blocks
            .iter()
            .map(|block| block_to_node(block, &self.registry))
            .collect()
    }

    fn check_ids(&self, blocks: &[PartialBlock], freed: &HashSet<String>) -> Result<()> {
        let mut seen = HashSet::new();
        let mut pending: Vec<&PartialBlock> = blocks.iter().collect();
        while let Some(block) = pending.pop() {
            if let Some(id) = block.id.as_deref().filter(|id| !id.is_empty()) {
                let taken = !freed.contains(id) && tree::find_container(&self.doc, id).is_some();
                if taken || !seen.insert(id) {
                    return Err(BlockError::DuplicateId(id.to_string()));
                }
            }
            pending.extend(block.children.iter().flatten());
        }
        Ok(())
    }

    /// Container paths of `ids`, outermost only, in reverse document order.
    ///
    /// Removing along these paths one by one never moves a path still to
    /// be removed.
    fn removal_paths(&self, ids: &[&str]) -> Result<Vec<Vec<usize>>> {
        let mut paths = ids
            .iter()
            .map(|id| self.container_path(id))
            .collect::<Result<Vec<_>>>()?;
        paths.sort();
        paths.dedup();

        let mut outermost: Vec<Vec<usize>> = Vec::new();
        for path in paths {
            if !outermost.iter().any(|ancestor| path.starts_with(ancestor)) {
                outermost.push(path);
            }
        }
        outermost.reverse();
        Ok(outermost)
    }

    fn remove_paths(&self, mut doc: Node, paths: &[Vec<usize>]) -> Result<Node> {
        for path in paths {
            let Some((&idx, group_path)) = path.split_last() else {
                continue;
            };
            doc = tree::splice(&doc, group_path, idx..idx + 1, Vec::new())?;

            let nested_group_emptied = group_path.len() > 1
                && tree::node_at(&doc, group_path).is_some_and(|g| g.child_count() == 0);
            if nested_group_emptied && let Some((&group_idx, container_path)) = group_path.split_last() {
                doc = tree::splice(&doc, container_path, group_idx..group_idx + 1, Vec::new())?;
            }
        }

        if doc.first_child().is_none_or(|group| group.child_count() == 0) {
            let blank = block_to_node(
                &PartialBlock::new(self.registry.default_block_type()),
                &self.registry,
            )?;
            doc = tree::splice(&doc, &[0], 0..0, vec![blank])?;
        }
        Ok(doc)
    }

    /// Installs an edited tree and brings the cache, cursor and selection
    /// in line with it.
    pub(super) fn after_mutation(&mut self, doc: Node, operation: &str) {
        self.doc = doc;
        let pruned = self.cache.get_mut().prune();

        if tree::find_container(&self.doc, &self.text_cursor).is_none() {
            self.text_cursor = self.first_block_id();
        }
        if let Some(ids) = &mut self.selection {
            ids.retain(|id| tree::find_container(&self.doc, id).is_some());
            if ids.is_empty() {
                self.selection = None;
            }
        }
        log::debug!(
            "{operation}: {} top-level blocks, {pruned} stale cache entries dropped",
            self.top_level().len()
        );
    }
}

/// Moves `paths` past `count` nodes inserted at `at` in the group at `group_path`.
fn shift_for_insert(paths: &mut [Vec<usize>], group_path: &[usize], at: usize, count: usize) {
    let depth = group_path.len();
    for path in paths.iter_mut() {
        if path.len() > depth && path.starts_with(group_path) && path[depth] >= at {
            path[depth] += count;
        }
    }
}

fn insert_nodes(doc: &Node, reference: Vec<usize>, nodes: Vec<Node>, placement: Placement) -> Result<Node> {
    match placement {
        Placement::Before | Placement::After => {
            let Some((&idx, group_path)) = reference.split_last() else {
                return Err(BlockError::MalformedNode("reference block is the root".to_string()));
            };
            let at = if placement == Placement::Before { idx } else { idx + 1 };
            tree::splice(doc, group_path, at..at, nodes)
        }
        Placement::Nested => {
            let container = tree::node_at(doc, &reference)
                .ok_or_else(|| BlockError::MalformedNode(format!("no node at {reference:?}")))?;
            match container.child(1) {
                Some(group) => {
                    let end = group.child_count();
                    let mut group_path = reference.clone();
                    group_path.push(1);
                    tree::splice(doc, &group_path, end..end, nodes)
                }
                None => {
                    let end = container.child_count();
                    let group = Node::new(BLOCK_GROUP, Attrs::new(), nodes);
                    tree::splice(doc, &reference, end..end, vec![group])
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditorOptions;
    use crate::model::{BlockContent, inline_text};
    use crate::schema::PropValue;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn editor() -> Editor {
        Editor::new(EditorOptions::default().with_initial_content(vec![
            PartialBlock::new("paragraph").with_id("a").with_content("A"),
            PartialBlock::new("paragraph")
                .with_id("b")
                .with_content("B")
                .with_children(vec![PartialBlock::new("paragraph").with_id("b1").with_content("B1")]),
            PartialBlock::new("paragraph").with_id("c").with_content("C"),
        ]))
        .unwrap()
    }

    /// Ids in document order, nesting shown with brackets.
    fn outline(blocks: &[Block]) -> String {
        blocks
            .iter()
            .map(|b| {
                if b.children.is_empty() {
                    b.id.clone()
                } else {
                    format!("{}[{}]", b.id, outline(&b.children))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn text(block: &Block) -> String {
        match &block.content {
            Some(BlockContent::Inline(content)) => inline_text(content),
            _ => String::new(),
        }
    }

    #[rstest]
    #[case("a", Placement::Before, "x a b[b1] c")]
    #[case("a", Placement::After, "a x b[b1] c")]
    #[case("b1", Placement::After, "a b[b1 x] c")]
    #[case("b", Placement::Nested, "a b[b1 x] c")]
    #[case("c", Placement::Nested, "a b[b1] c[x]")]
    fn test_insert_placements(#[case] reference: &str, #[case] placement: Placement, #[case] expected: &str) {
        let mut editor = editor();
        let inserted = editor
            .insert_blocks(&[PartialBlock::new("paragraph").with_id("x")], reference, placement)
            .unwrap();
        assert_eq!(inserted[0].id, "x");
        assert_eq!(outline(&editor.document().unwrap()), expected);
    }

    #[test]
    fn test_insert_generates_ids_and_rejects_duplicates() {
        let mut editor = editor();
        let inserted = editor
            .insert_blocks(&[PartialBlock::new("heading")], "c", Placement::After)
            .unwrap();
        assert!(!inserted[0].id.is_empty());
        assert_eq!(editor.get_block(&inserted[0].id).unwrap(), inserted[0]);

        let err = editor
            .insert_blocks(&[PartialBlock::new("paragraph").with_id("b1")], "a", Placement::After)
            .unwrap_err();
        assert!(matches!(err, BlockError::DuplicateId(ref id) if id == "b1"));
        assert!(matches!(
            editor.insert_blocks(&[PartialBlock::new("paragraph")], "zzz", Placement::After),
            Err(BlockError::BlockNotFound(_))
        ));
    }

    #[test]
    fn test_update_keeps_children_and_merges_props() {
        let mut editor = editor();
        let updated = editor
            .update_block(
                "b",
                &PartialBlock::new("heading").with_prop("level", 2i64).with_prop("textColor", "red"),
            )
            .unwrap();
        assert_eq!(updated.block_type, "heading");
        assert_eq!(updated.props["level"], PropValue::Number(2));
        assert_eq!(updated.props["textColor"], PropValue::from("red"));
        assert_eq!(text(&updated), "B");
        assert_eq!(outline(&editor.document().unwrap()), "a b[b1] c");

        let updated = editor
            .update_block("b", &PartialBlock::new("paragraph").with_children(vec![]))
            .unwrap();
        assert_eq!(updated.props["textColor"], PropValue::from("red"));
        assert_eq!(outline(&editor.document().unwrap()), "a b c");
    }

    #[test]
    fn test_update_rejects_undeclared_props() {
        let mut editor = editor();
        let err = editor
            .update_block("a", &PartialBlock::new("paragraph").with_prop("level", 2i64))
            .unwrap_err();
        assert!(matches!(err, BlockError::Schema(_)));
        assert_eq!(text(&editor.get_block("a").unwrap()), "A");
    }

    #[test]
    fn test_remove_drops_emptied_groups_and_keeps_one_block() {
        let mut editor = editor();
        editor.remove_blocks(&["b1"]).unwrap();
        assert_eq!(outline(&editor.document().unwrap()), "a b c");

        editor.remove_blocks(&["a", "b", "c"]).unwrap();
        let doc = editor.document().unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc[0].block_type, "paragraph");
        assert_eq!(editor.text_cursor_block().unwrap().id, doc[0].id);
    }

    #[test]
    fn test_remove_with_unknown_id_changes_nothing() {
        let mut editor = editor();
        assert!(editor.remove_blocks(&["a", "nope"]).is_err());
        assert_eq!(outline(&editor.document().unwrap()), "a b[b1] c");
    }

    #[test]
    fn test_replace_blocks_may_reuse_ids() {
        let mut editor = editor();
        let replaced = editor
            .replace_blocks(
                &["b", "c"],
                &[PartialBlock::new("heading").with_id("b").with_content("new")],
            )
            .unwrap();
        assert_eq!(replaced[0].block_type, "heading");
        assert_eq!(outline(&editor.document().unwrap()), "a b");
        assert_eq!(text(&editor.get_block("b").unwrap()), "new");
    }

    #[rstest]
    #[case::child_first(&["b1", "b"])]
    #[case::parent_first(&["b", "b1"])]
    #[case::repeated(&["b", "b", "b1"])]
    fn test_remove_child_and_parent_together(#[case] ids: &[&str]) {
        let mut editor = editor();
        editor.remove_blocks(ids).unwrap();
        assert_eq!(outline(&editor.document().unwrap()), "a c");
    }

    #[rstest]
    #[case::child_first(&["b1", "b"])]
    #[case::parent_first(&["b", "b1"])]
    fn test_replace_child_and_parent_together(#[case] ids: &[&str]) {
        let mut editor = editor();
        let replaced = editor
            .replace_blocks(ids, &[PartialBlock::new("paragraph").with_id("x")])
            .unwrap();
        assert_eq!(replaced[0].id, "x");
        assert_eq!(outline(&editor.document().unwrap()), "a x c");
    }

    #[test]
    fn test_replace_siblings_keeps_position() {
        let mut editor = editor();
        editor
            .replace_blocks(
                &["c", "a"],
                &[
                    PartialBlock::new("paragraph").with_id("x"),
                    PartialBlock::new("paragraph").with_id("a"),
                ],
            )
            .unwrap();
        assert_eq!(outline(&editor.document().unwrap()), "b[b1] x a");
    }

    #[test]
    fn test_selection_is_outermost_blocks_in_order() {
        let mut editor = editor();
        editor.set_selection("c", "b").unwrap();
        let ids: Vec<String> = editor
            .selection()
            .unwrap()
            .unwrap()
            .blocks
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec!["b", "c"]);

        editor.remove_blocks(&["c"]).unwrap();
        assert_eq!(editor.selection().unwrap().unwrap().blocks.len(), 1);
        editor.clear_selection();
        assert!(editor.selection().unwrap().is_none());
    }

    #[test]
    fn test_cursor_moves_to_first_block_when_its_block_goes() {
        let mut editor = editor();
        editor.set_text_cursor("c").unwrap();
        editor.remove_blocks(&["c"]).unwrap();
        assert_eq!(editor.text_cursor_block().unwrap().id, "a");
        assert!(editor.set_text_cursor("c").is_err());
    }
}
