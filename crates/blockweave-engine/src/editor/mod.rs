//! # Editor
//!
//! Owns one document: the schema registry it was built with, the root of the
//! structural node tree, the block cache and the cursor and selection.
//!
//! All reads go through the converter and serializer and take `&self`.
//! Every change goes through the command surface in [`commands`] and
//! [`styles`], which rebuild the tree along the edited path and leave the
//! rest of it shared.

pub mod commands;
pub mod options;
pub mod styles;

use std::cell::RefCell;

pub use commands::{Placement, Selection};
pub use options::EditorOptions;

use crate::convert::{BlockCache, block_to_node, node_to_block};
use crate::dom::Element;
use crate::error::Result;
use crate::html_import::html_to_blocks;
use crate::markdown::{blocks_to_markdown, markdown_to_blocks};
use crate::model::{Block, PartialBlock};
use crate::node::{Attrs, BLOCK_GROUP, DOC, Node, tree};
use crate::schema::SchemaRegistry;
use crate::serializer::{HtmlMode, HtmlSerializer};
use crate::spec::{DomAttributes, inline_content};

pub struct Editor {
    registry: SchemaRegistry,
    doc: Node,
    cache: RefCell<BlockCache>,
    dom_attributes: DomAttributes,
    clipboard_mime_type: String,
    text_cursor: String,
    selection: Option<Vec<String>>,
}

impl Editor {
    /// Builds the schema and the initial document.
    pub fn new(options: EditorOptions) -> Result<Self> {
        let mut schema = options.schema;
        if let Some(inherited) = options.inherited_props {
            schema = schema.inherited_props(inherited);
        }
        let registry = schema.build()?;

        let initial = if options.initial_content.is_empty() {
            vec![PartialBlock::new(registry.default_block_type())]
        } else {
            options.initial_content
        };
        let containers = initial
            .iter()
            .map(|block| block_to_node(block, &registry))
            .collect::<Result<Vec<_>>>()?;
        let doc = Node::new(
            DOC,
            Attrs::new(),
            vec![Node::new(BLOCK_GROUP, Attrs::new(), containers)],
        );

        let mut editor = Self {
            registry,
            doc,
            cache: RefCell::new(BlockCache::new()),
            dom_attributes: options.dom_attributes,
            clipboard_mime_type: options.clipboard_mime_type,
            text_cursor: String::new(),
            selection: None,
        };
        editor.text_cursor = editor.first_block_id();
        log::debug!(
            "created editor with {} top-level blocks",
            editor.top_level().len()
        );
        Ok(editor)
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn dom_attributes(&self) -> &DomAttributes {
        &self.dom_attributes
    }

    pub fn clipboard_mime_type(&self) -> &str {
        &self.clipboard_mime_type
    }

    /// Root `doc` node of the structural tree.
    pub fn document_node(&self) -> &Node {
        &self.doc
    }

    /// Top-level containers.
    fn top_level(&self) -> &[Node] {
        self.doc.first_child().map(Node::content).unwrap_or(&[])
    }

    fn first_block_id(&self) -> String {
        tree::containers(&self.doc)
            .first()
            .and_then(|c| c.attr("id"))
            .and_then(|id| id.as_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Every top-level block, children nested inside.
    pub fn document(&self) -> Result<Vec<Block>> {
        self.top_level()
            .iter()
            .map(|container| self.block_for_node(container))
            .collect()
    }

    /// The block for a `blockContainer` node, served from the cache when
    /// the node has been converted before.
    pub fn block_for_node(&self, container: &Node) -> Result<Block> {
        node_to_block(container, &self.registry, &mut self.cache.borrow_mut())
    }

    /// Placeholder element for a custom block render to mark its content hole.
    pub fn inline_content(&self, tag: &str) -> Element {
        inline_content(tag, &self.dom_attributes)
    }

    pub fn blocks_to_internal_html(&self, blocks: &[Block]) -> Result<String> {
        self.blocks_to_html(blocks, HtmlMode::Internal)
    }

    pub fn blocks_to_external_html(&self, blocks: &[Block]) -> Result<String> {
        self.blocks_to_html(blocks, HtmlMode::External)
    }

    fn blocks_to_html(&self, blocks: &[Block], mode: HtmlMode) -> Result<String> {
        let containers = blocks
            .iter()
            .map(|block| block_to_node(&PartialBlock::from(block.clone()), &self.registry))
            .collect::<Result<Vec<_>>>()?;
        let group = Node::new(BLOCK_GROUP, Attrs::new(), containers);
        let html = HtmlSerializer::new(self, mode).to_html(std::slice::from_ref(&group));
        drop(group);
        // Custom blocks above were cached against nodes that are now gone.
        self.cache.borrow_mut().prune();
        html
    }

    pub fn blocks_to_markdown(&self, blocks: &[Block]) -> Result<String> {
        blocks_to_markdown(blocks)
    }

    /// The whole document as internal HTML.
    pub fn to_internal_html(&self) -> Result<String> {
        HtmlSerializer::new(self, HtmlMode::Internal).to_html(self.doc.content())
    }

    /// The whole document as external HTML.
    pub fn to_external_html(&self) -> Result<String> {
        HtmlSerializer::new(self, HtmlMode::External).to_html(self.doc.content())
    }

    pub fn to_markdown(&self) -> Result<String> {
        blocks_to_markdown(&self.document()?)
    }

    /// The rendered content element of one block, for hosting it in a view.
    pub fn node_view(&self, id: &str) -> Result<Element> {
        let container = self.container(id)?;
        HtmlSerializer::new(self, HtmlMode::Internal).serialize_block_content(&container)
    }

    /// Blocks read from HTML, validated against the schema.
    pub fn try_parse_html_to_blocks(&self, html: &str) -> Result<Vec<Block>> {
        self.materialize(&html_to_blocks(html, &self.registry))
    }

    /// Blocks read from Markdown, validated against the schema.
    pub fn try_parse_markdown_to_blocks(&self, markdown: &str) -> Result<Vec<Block>> {
        self.materialize(&markdown_to_blocks(markdown, &self.registry))
    }

    fn materialize(&self, blocks: &[PartialBlock]) -> Result<Vec<Block>> {
        let mut cache = BlockCache::new();
        blocks
            .iter()
            .map(|block| {
                let node = block_to_node(block, &self.registry)?;
                node_to_block(&node, &self.registry, &mut cache)
            })
            .collect()
    }
}
