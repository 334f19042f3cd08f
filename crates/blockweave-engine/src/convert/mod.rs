//! # Node <-> Block conversion
//!
//! [`node_to_block`] derives the JSON view of a `blockContainer` node and
//! [`block_to_node`] builds a fresh container from a [`PartialBlock`].
//!
//! Props are split across two nodes: the container carries the block `id`
//! and the inherited props, the content node carries everything else.
//! Reading layers the content node's attrs over the container's, so either
//! placement decodes.

pub mod cache;

pub use cache::BlockCache;

use uuid::Uuid;

use crate::codec::{Layered, attributes_from_props, props_from_attributes};
use crate::error::{BlockError, Result, SchemaError};
use crate::model::{
    Block, BlockContent, InlineContent, Link, PartialBlock, PartialContent, StyleValue,
    StyledText, Styles, TableContent, TableContentType, TableRow,
};
use crate::node::{Attrs, BLOCK_CONTAINER, BLOCK_GROUP, LINK_MARK, Mark, Node, TABLE_CELL, TABLE_ROW};
use crate::schema::{BlockSpec, ContentKind, PropValue, Props, SchemaRegistry, StylePropSchema};

/// Mark attribute holding the value of a string style.
pub const STYLE_VALUE_ATTR: &str = "stringValue";

/// Mark attribute holding a link target.
pub const HREF_ATTR: &str = "href";

pub fn new_block_id() -> String {
    Uuid::new_v4().to_string()
}

/// The block a `blockContainer` node stands for, children included.
///
/// Cached by node identity: asking twice for the same node returns the same
/// block, including any id generated for a container that had none.
pub fn node_to_block(
    container: &Node,
    registry: &SchemaRegistry,
    cache: &mut BlockCache,
) -> Result<Block> {
    if let Some(block) = cache.get(container) {
        log::trace!("block cache hit for `{}`", block.id);
        return Ok(block.clone());
    }
    if container.type_name() != BLOCK_CONTAINER {
        return Err(BlockError::MalformedNode(format!(
            "expected `{BLOCK_CONTAINER}`, found `{}`",
            container.type_name()
        )));
    }
    let (content, group) = match container.content() {
        [content] => (content, None),
        [content, group] => (content, Some(group)),
        other => {
            return Err(BlockError::MalformedNode(format!(
                "`{BLOCK_CONTAINER}` must have 1 or 2 children, found {}",
                other.len()
            )));
        }
    };

    let spec = registry.require_block(content.type_name())?;
    let id = match container.attr("id").and_then(PropValue::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => new_block_id(),
    };
    let props = props_from_attributes(
        spec.block_type(),
        &spec.config.prop_schema,
        &Layered {
            primary: content.attrs(),
            fallback: container.attrs(),
        },
    );
    let block_content = match spec.config.content {
        ContentKind::Inline => Some(BlockContent::Inline(nodes_to_inline_content(
            content.content(),
            registry,
        )?)),
        ContentKind::Table => Some(BlockContent::Table(nodes_to_table(content, registry)?)),
        ContentKind::None => None,
    };

    let mut children = Vec::new();
    if let Some(group) = group {
        if group.type_name() != BLOCK_GROUP {
            return Err(BlockError::MalformedNode(format!(
                "second child of `{id}` is `{}`, expected `{BLOCK_GROUP}`",
                group.type_name()
            )));
        }
        for child in group.content() {
            children.push(node_to_block(child, registry, cache)?);
        }
    }

    let block = Block {
        id,
        block_type: spec.block_type().to_string(),
        props,
        content: block_content,
        children,
    };
    cache.insert(container, block.clone());
    Ok(block)
}

/// Builds a `blockContainer` node for `block`, generating missing ids.
pub fn block_to_node(block: &PartialBlock, registry: &SchemaRegistry) -> Result<Node> {
    let spec = registry.require_block(&block.block_type)?;
    let id = block
        .id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(new_block_id);

    let empty = Props::new();
    let attrs = attributes_from_props(
        spec.block_type(),
        &spec.config.prop_schema,
        block.props.as_ref().unwrap_or(&empty),
    )?;
    let (mut container_attrs, content_attrs): (Attrs, Attrs) = attrs
        .into_iter()
        .partition(|(name, _)| registry.is_inherited(name));
    container_attrs.insert("id".to_string(), PropValue::Str(id));

    let content = content_nodes(spec, block.content.as_ref(), registry)?;
    let mut children = vec![Node::new(spec.block_type(), content_attrs, content)];
    if let Some(nested) = &block.children
        && !nested.is_empty()
    {
        let nodes = nested
            .iter()
            .map(|child| block_to_node(child, registry))
            .collect::<Result<Vec<_>>>()?;
        children.push(Node::new(BLOCK_GROUP, Attrs::new(), nodes));
    }
    Ok(Node::new(BLOCK_CONTAINER, container_attrs, children))
}

fn content_nodes(
    spec: &BlockSpec,
    content: Option<&PartialContent>,
    registry: &SchemaRegistry,
) -> Result<Vec<Node>> {
    match (spec.config.content, content) {
        (_, None) => Ok(Vec::new()),
        (_, Some(PartialContent::Inline(items))) if items.is_empty() => Ok(Vec::new()),
        (_, Some(PartialContent::Text(text))) if text.is_empty() => Ok(Vec::new()),
        (ContentKind::Inline, Some(PartialContent::Text(text))) => {
            Ok(vec![Node::text(text.clone(), Vec::new())])
        }
        (ContentKind::Inline, Some(PartialContent::Inline(items))) => {
            let items: Vec<InlineContent> =
                items.iter().cloned().map(|item| item.into_inline()).collect();
            inline_content_to_nodes(&items, registry)
        }
        (ContentKind::Table, Some(PartialContent::Table(table))) => table_to_nodes(table, registry),
        (kind, Some(_)) => Err(BlockError::ContentMismatch {
            block_type: spec.block_type().to_string(),
            expected: kind.as_str(),
        }),
    }
}

/// The mark for one style entry, or `None` for a boolean style set to `false`.
pub fn style_mark(
    style_type: &str,
    value: &StyleValue,
    registry: &SchemaRegistry,
) -> Result<Option<Mark>> {
    let spec = registry.require_style(style_type)?;
    match (spec.config.prop_schema, value) {
        (StylePropSchema::Boolean, StyleValue::Flag(true)) => Ok(Some(Mark::new(style_type))),
        (StylePropSchema::Boolean, StyleValue::Flag(false)) => Ok(None),
        (StylePropSchema::String, StyleValue::Value(v)) => {
            Ok(Some(Mark::new(style_type).with_attr(STYLE_VALUE_ATTR, v.as_str())))
        }
        _ => Err(SchemaError::InvalidPropValue {
            owner: style_type.to_string(),
            prop: "value".to_string(),
            value: format!("{value:?}"),
        }
        .into()),
    }
}

/// Marks for a style map, in registry order.
pub fn styles_to_marks(styles: &Styles, registry: &SchemaRegistry) -> Result<Vec<Mark>> {
    let mut marks = Vec::with_capacity(styles.len());
    for (style_type, value) in styles {
        if let Some(mark) = style_mark(style_type, value, registry)? {
            marks.push(mark);
        }
    }
    sort_marks(&mut marks, registry);
    Ok(marks)
}

/// Orders marks the way the serializer nests them: links outermost, then
/// styles in registration order.
pub fn sort_marks(marks: &mut [Mark], registry: &SchemaRegistry) {
    marks.sort_by_key(|m| registry.mark_rank(&m.mark_type).unwrap_or(usize::MAX));
}

/// The style map carried by a text node's marks, links excluded.
pub fn marks_to_styles(marks: &[Mark], registry: &SchemaRegistry) -> Result<Styles> {
    let mut styles = Styles::new();
    for mark in marks.iter().filter(|m| m.mark_type != LINK_MARK) {
        let spec = registry.require_style(&mark.mark_type)?;
        let value = match spec.config.prop_schema {
            StylePropSchema::Boolean => StyleValue::Flag(true),
            StylePropSchema::String => StyleValue::Value(
                mark.attr(STYLE_VALUE_ATTR)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            ),
        };
        styles.insert(mark.mark_type.clone(), value);
    }
    Ok(styles)
}

/// Text nodes for inline content. Empty runs produce no node.
pub fn inline_content_to_nodes(
    content: &[InlineContent],
    registry: &SchemaRegistry,
) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    for item in content {
        match item {
            InlineContent::Text(run) => {
                if !run.text.is_empty() {
                    nodes.push(Node::text(run.text.clone(), styles_to_marks(&run.styles, registry)?));
                }
            }
            InlineContent::Link(link) => {
                for run in link.content.iter().filter(|r| !r.text.is_empty()) {
                    let mut marks = styles_to_marks(&run.styles, registry)?;
                    marks.push(Mark::new(LINK_MARK).with_attr(HREF_ATTR, link.href.as_str()));
                    sort_marks(&mut marks, registry);
                    nodes.push(Node::text(run.text.clone(), marks));
                }
            }
        }
    }
    Ok(nodes)
}

/// Inline content for a sequence of text nodes.
///
/// Adjacent runs with equal styles merge, and consecutive runs sharing a link
/// target become one [`Link`].
pub fn nodes_to_inline_content(
    nodes: &[Node],
    registry: &SchemaRegistry,
) -> Result<Vec<InlineContent>> {
    let mut out: Vec<InlineContent> = Vec::new();
    for node in nodes {
        let Some(text) = node.text_value() else {
            return Err(BlockError::MalformedNode(format!(
                "`{}` inside inline content",
                node.type_name()
            )));
        };
        let run = StyledText {
            text: text.to_string(),
            styles: marks_to_styles(node.marks(), registry)?,
        };
        let href = node
            .marks()
            .iter()
            .find(|m| m.mark_type == LINK_MARK)
            .and_then(|m| m.attr(HREF_ATTR))
            .map(|v| v.to_string());

        push_inline(&mut out, run, href);
    }
    Ok(out)
}

/// Appends a run, merging it into the previous item when styles and link
/// target agree.
pub fn push_inline(out: &mut Vec<InlineContent>, run: StyledText, href: Option<String>) {
    if run.text.is_empty() {
        return;
    }
    match (href, out.last_mut()) {
        (Some(href), Some(InlineContent::Link(link))) if link.href == href => {
            push_run(&mut link.content, run)
        }
        (Some(href), _) => out.push(InlineContent::Link(Link {
            href,
            content: vec![run],
        })),
        (None, Some(InlineContent::Text(prev))) if prev.styles == run.styles => {
            prev.text.push_str(&run.text)
        }
        (None, _) => out.push(InlineContent::Text(run)),
    }
}

fn push_run(runs: &mut Vec<StyledText>, run: StyledText) {
    match runs.last_mut() {
        Some(prev) if prev.styles == run.styles => prev.text.push_str(&run.text),
        _ => runs.push(run),
    }
}

fn table_to_nodes(table: &TableContent, registry: &SchemaRegistry) -> Result<Vec<Node>> {
    table
        .rows
        .iter()
        .map(|row| {
            let cells = row
                .cells
                .iter()
                .map(|cell| {
                    Ok(Node::new(
                        TABLE_CELL,
                        Attrs::new(),
                        inline_content_to_nodes(cell, registry)?,
                    ))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Node::new(TABLE_ROW, Attrs::new(), cells))
        })
        .collect()
}

fn nodes_to_table(content: &Node, registry: &SchemaRegistry) -> Result<TableContent> {
    let mut rows = Vec::with_capacity(content.child_count());
    for row in content.content() {
        if row.type_name() != TABLE_ROW {
            return Err(BlockError::MalformedNode(format!(
                "`{}` inside table content",
                row.type_name()
            )));
        }
        let cells = row
            .content()
            .iter()
            .map(|cell| nodes_to_inline_content(cell.content(), registry))
            .collect::<Result<Vec<_>>>()?;
        rows.push(TableRow { cells });
    }
    Ok(TableContent {
        kind: TableContentType::TableContent,
        rows,
    })
}

/// Applies `update` on top of `prior`.
///
/// Props keep the prior values the new type still declares and accepts,
/// take every override, and fill the rest with defaults. Content and
/// children are replaced only when `update` supplies them; prior content is
/// dropped if the new type holds a different kind.
pub fn merge_partial_block(
    prior: &Block,
    update: &PartialBlock,
    registry: &SchemaRegistry,
) -> Result<PartialBlock> {
    let spec = registry.require_block(&update.block_type)?;
    let schema = &spec.config.prop_schema;

    let mut props: Props = prior
        .props
        .iter()
        .filter(|(name, value)| schema.get(name).is_some_and(|s| s.accepts(value)))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    if let Some(overrides) = &update.props {
        props.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    for (name, default) in schema.defaults() {
        props.entry(name).or_insert(default);
    }
    attributes_from_props(spec.block_type(), schema, &props)?;

    let content = match &update.content {
        Some(content) => Some(content.clone()),
        None => match (spec.config.content, &prior.content) {
            (ContentKind::Inline, Some(BlockContent::Inline(items))) => {
                Some(PartialContent::from(items.clone()))
            }
            (ContentKind::Table, Some(BlockContent::Table(table))) => {
                Some(PartialContent::Table(table.clone()))
            }
            _ => None,
        },
    };
    let children = update
        .children
        .clone()
        .unwrap_or_else(|| prior.children.iter().cloned().map(PartialBlock::from).collect());

    Ok(PartialBlock {
        id: Some(prior.id.clone()),
        block_type: update.block_type.clone(),
        props: Some(props),
        content,
        children: Some(children),
    })
}
