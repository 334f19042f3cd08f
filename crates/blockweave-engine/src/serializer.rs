//! # HTML serializer
//!
//! Walks the node tree and builds detached DOM, choosing per node type
//! between its built-in render and a custom block's serializer.
//!
//! For each `blockContainer` the container shell is rendered first. If the
//! content node is custom-rendered, the container is converted to a
//! [`Block`](crate::model::Block) and handed to the spec's serializer; the
//! content node's inline content goes into the returned content hole, and the
//! nested `blockGroup`, if any, follows the content inside the container's
//! hole. Built-in content nodes are serialized like any other node.

use crate::convert::{HREF_ATTR, STYLE_VALUE_ATTR};
use crate::dom::{DomNode, Element, RenderSpec, nodes_to_html};
use crate::editor::Editor;
use crate::error::{BlockError, Result};
use crate::node::{BLOCK_CONTAINER, LINK_MARK, Mark, Node};
use crate::schema::{PropValue, RenderContext, RenderStrategy};

/// Which serializers custom blocks use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlMode {
    /// Output the editor can import again without loss.
    Internal,
    /// Output for other applications; custom blocks may render differently.
    External,
}

pub struct HtmlSerializer<'a> {
    editor: &'a Editor,
    mode: HtmlMode,
}

impl<'a> HtmlSerializer<'a> {
    pub fn new(editor: &'a Editor, mode: HtmlMode) -> Self {
        Self { editor, mode }
    }

    fn context(&self) -> RenderContext<'a> {
        RenderContext {
            registry: self.editor.schema(),
            dom_attributes: self.editor.dom_attributes(),
        }
    }

    /// Serializes `nodes` and writes the result as an HTML string.
    pub fn to_html(&self, nodes: &[Node]) -> Result<String> {
        Ok(nodes_to_html(&self.serialize_fragment(nodes)?))
    }

    /// Serializes a sequence of siblings.
    ///
    /// Text nodes are wrapped in their marks' renders. Adjacent text nodes
    /// share the wrappers of their common leading marks.
    pub fn serialize_fragment(&self, nodes: &[Node]) -> Result<Vec<DomNode>> {
        let mut out = Vec::new();
        let mut open: Vec<(Mark, RenderSpec)> = Vec::new();

        for node in nodes {
            let Some(text) = node.text_value() else {
                close_marks(&mut open, 0, &mut out);
                out.push(self.serialize_node(node)?);
                continue;
            };
            let marks = node.marks();
            let keep = open
                .iter()
                .zip(marks)
                .take_while(|((active, _), mark)| active == *mark)
                .count();
            close_marks(&mut open, keep, &mut out);
            for mark in &marks[keep..] {
                open.push((mark.clone(), self.render_mark(mark)?));
            }
            append(&mut open, &mut out, DomNode::Text(text.to_string()));
        }
        close_marks(&mut open, 0, &mut out);
        Ok(out)
    }

    /// Serializes one non-text node and everything below it.
    pub fn serialize_node(&self, node: &Node) -> Result<DomNode> {
        if node.is_text() {
            let mut nodes = self.serialize_fragment(std::slice::from_ref(node))?;
            return Ok(nodes.pop().unwrap_or(DomNode::Text(String::new())));
        }

        let registry = self.editor.schema();
        let spec = registry
            .node_type(node.type_name())
            .ok_or_else(|| BlockError::UnknownBlockType(node.type_name().to_string()))?;
        let RenderStrategy::BuiltIn(render) = &spec.render else {
            return Err(BlockError::MalformedNode(format!(
                "custom block `{}` outside a `{BLOCK_CONTAINER}`",
                node.type_name()
            )));
        };

        let mut rendered = render(node, &self.context());
        if !rendered.has_hole() {
            return Ok(rendered.dom.into());
        }
        if spec.is_leaf() {
            return Err(BlockError::InvalidLeafContent(node.type_name().to_string()));
        }

        let children = if node.type_name() == BLOCK_CONTAINER {
            self.container_children(node)?
        } else {
            self.serialize_fragment(node.content())?
        };
        fill_hole(&mut rendered, children);
        Ok(rendered.dom.into())
    }

    fn container_children(&self, container: &Node) -> Result<Vec<DomNode>> {
        let Some(content) = container.first_child() else {
            return Err(BlockError::MalformedNode(format!(
                "empty `{BLOCK_CONTAINER}`"
            )));
        };
        let custom = self
            .editor
            .schema()
            .node_type(content.type_name())
            .is_some_and(|spec| spec.is_custom());
        if !custom {
            return self.serialize_fragment(container.content());
        }

        let mut children = vec![DomNode::Element(self.serialize_block_content(container)?)];
        if let Some(group) = container.child(1) {
            children.push(self.serialize_node(group)?);
        }
        Ok(children)
    }

    /// The block content element of a container, inline content included.
    pub fn serialize_block_content(&self, container: &Node) -> Result<Element> {
        let content = container.first_child().ok_or_else(|| {
            BlockError::MalformedNode(format!("empty `{BLOCK_CONTAINER}`"))
        })?;
        let spec = self
            .editor
            .schema()
            .node_type(content.type_name())
            .ok_or_else(|| BlockError::UnknownBlockType(content.type_name().to_string()))?;

        let RenderStrategy::Custom(custom) = &spec.render else {
            return match self.serialize_node(content)? {
                DomNode::Element(el) => Ok(el),
                DomNode::Text(_) => Err(BlockError::MalformedNode(format!(
                    "`{}` rendered as text",
                    content.type_name()
                ))),
            };
        };

        let block = self.editor.block_for_node(container)?;
        let serialize = match self.mode {
            HtmlMode::Internal => &custom.to_internal_html,
            HtmlMode::External => &custom.to_external_html,
        };
        let mut rendered = serialize(&block, self.editor)?;
        if rendered.has_hole() {
            if spec.is_leaf() {
                return Err(BlockError::InvalidLeafContent(content.type_name().to_string()));
            }
            let inline = self.serialize_fragment(content.content())?;
            fill_hole(&mut rendered, inline);
        }
        Ok(rendered.dom)
    }

    fn render_mark(&self, mark: &Mark) -> Result<RenderSpec> {
        if mark.mark_type == LINK_MARK {
            let href = mark.attr(HREF_ATTR).map(PropValue::to_string).unwrap_or_default();
            return Ok(RenderSpec::wrapper(
                Element::new("a")
                    .with_attr("href", href)
                    .with_attr("target", "_blank")
                    .with_attr("rel", "noopener noreferrer nofollow"),
            ));
        }
        let spec = self.editor.schema().require_style(&mark.mark_type)?;
        let value = mark.attr(STYLE_VALUE_ATTR).and_then(PropValue::as_str);
        Ok((spec.render)(value))
    }
}

fn fill_hole(rendered: &mut RenderSpec, children: Vec<DomNode>) {
    match rendered.hole_mut() {
        Some(hole) => hole.children.extend(children),
        None => rendered.dom.children.extend(children),
    }
}

/// Appends to the innermost open mark, or to `out` when none is open.
fn append(open: &mut [(Mark, RenderSpec)], out: &mut Vec<DomNode>, node: DomNode) {
    match open.last_mut() {
        Some((_, spec)) => fill_hole(spec, vec![node]),
        None => out.push(node),
    }
}

/// Closes open marks until `keep` remain.
fn close_marks(open: &mut Vec<(Mark, RenderSpec)>, keep: usize, out: &mut Vec<DomNode>) {
    while open.len() > keep {
        let Some((_, spec)) = open.pop() else {
            break;
        };
        append(open, out, DomNode::Element(spec.dom));
    }
}
