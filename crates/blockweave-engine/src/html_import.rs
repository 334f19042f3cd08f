//! # HTML import
//!
//! Reads HTML back into partial blocks using the parse rules the registered
//! specs declare. Internal HTML is recognized by its `data-node-type` and
//! `data-content-type` markers; foreign markup falls back to tag rules such
//! as `<h2>` for a level 2 heading or `<li>` inside `<ol>` for a numbered
//! list item.
//!
//! Import never fails. Unknown block types are skipped, unknown markup is
//! read through for its text, and malformed `data-*` props decode to their
//! defaults.

use crate::codec::{DataAttributes, Layered, props_from_attributes};
use crate::convert::push_inline;
use crate::dom::{DomNode, Element, parse_fragment};
use crate::model::{InlineContent, PartialBlock, PartialContent, StyleValue, StyledText, Styles, TableContent, TableContentType, TableRow};
use crate::node::{BLOCK_CONTAINER, BLOCK_GROUP};
use crate::schema::{BlockSpec, ContentKind, ParseRule, Props, SchemaRegistry, StylePropSchema};
use crate::spec::INLINE_CONTENT_CLASS;

/// Tags read as part of an inline run rather than as a block.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "br", "code", "del", "em", "font", "i", "kbd", "mark", "s", "small", "span",
    "strike", "strong", "sub", "sup", "u",
];

/// Partial blocks for an HTML fragment.
pub fn html_to_blocks(html: &str, registry: &SchemaRegistry) -> Vec<PartialBlock> {
    let dom = parse_fragment(html);
    let mut out = Vec::new();
    Importer { registry }.blocks(&dom, None, &mut out);
    log::debug!("imported {} top-level blocks from HTML", out.len());
    out
}

struct Importer<'r> {
    registry: &'r SchemaRegistry,
}

impl Importer<'_> {
    fn blocks(&self, nodes: &[DomNode], parent_tag: Option<&str>, out: &mut Vec<PartialBlock>) {
        let mut loose: Vec<DomNode> = Vec::new();
        for node in nodes {
            match node {
                DomNode::Text(_) => loose.push(node.clone()),
                DomNode::Element(el) if self.is_inline(el) => loose.push(node.clone()),
                DomNode::Element(el) => {
                    self.flush_loose(&mut loose, out);
                    self.block_element(el, parent_tag, out);
                }
            }
        }
        self.flush_loose(&mut loose, out);
    }

    /// Turns stray inline content between blocks into a paragraph.
    fn flush_loose(&self, loose: &mut Vec<DomNode>, out: &mut Vec<PartialBlock>) {
        let has_text = loose.iter().any(|n| !n.text_content().trim().is_empty());
        if has_text {
            let content = self.inline(loose);
            out.push(
                PartialBlock::new(self.registry.default_block_type())
                    .with_content(PartialContent::from(content)),
            );
        }
        loose.clear();
    }

    fn is_inline(&self, el: &Element) -> bool {
        el.attr("data-style-type").is_some()
            || (INLINE_TAGS.contains(&el.tag.as_str())
                && el.attr("data-content-type").is_none()
                && el.attr("data-node-type").is_none())
    }

    fn is_node_type(&self, el: &Element, node_type: &str) -> bool {
        let Some(marker) = el.attr("data-node-type") else {
            return false;
        };
        self.registry.node_type(node_type).is_some_and(|spec| {
            spec.parse_rules
                .iter()
                .any(|rule| matches!(rule, ParseRule::NodeType(name) if name == marker))
        })
    }

    fn block_element(&self, el: &Element, parent_tag: Option<&str>, out: &mut Vec<PartialBlock>) {
        if self.is_node_type(el, BLOCK_CONTAINER) {
            out.extend(self.container(el));
            return;
        }
        if self.is_node_type(el, BLOCK_GROUP) {
            self.blocks(&el.children, Some(&el.tag), out);
            return;
        }
        if el.attr("data-content-type").is_some()
            && let Some(block) = self.content_element(el, None)
        {
            out.push(block);
            return;
        }
        if let Some((spec, props)) = self.match_tag(el, parent_tag) {
            out.push(self.tag_block(el, spec, props));
            return;
        }
        self.blocks(&el.children, Some(&el.tag), out);
    }

    /// A `blockOuter` element: its content element and nested group.
    fn container(&self, outer: &Element) -> Option<PartialBlock> {
        let inner = outer
            .element_children()
            .find(|c| c.attr("data-node-type") == Some(BLOCK_CONTAINER))
            .unwrap_or(outer);
        let content = inner
            .element_children()
            .find(|c| c.attr("data-content-type").is_some())?;
        let mut block = self.content_element(content, Some(inner))?;
        block.id = outer
            .attr("data-id")
            .or_else(|| inner.attr("data-id"))
            .map(str::to_string);

        let mut children = Vec::new();
        for group in inner
            .element_children()
            .filter(|c| self.is_node_type(c, BLOCK_GROUP))
        {
            self.blocks(&group.children, Some(&group.tag), &mut children);
        }
        if !children.is_empty() {
            block.children = Some(children);
        }
        Some(block)
    }

    /// A `[data-content-type]` element, props layered over its container's.
    fn content_element(&self, el: &Element, container: Option<&Element>) -> Option<PartialBlock> {
        let block_type = el.attr("data-content-type")?;
        let Some(spec) = self.registry.block_spec(block_type) else {
            log::warn!("skipping unknown block type `{block_type}` in HTML");
            return None;
        };
        let schema = &spec.config.prop_schema;
        let props = match container {
            Some(container) => props_from_attributes(
                block_type,
                schema,
                &Layered {
                    primary: DataAttributes(el),
                    fallback: DataAttributes(container),
                },
            ),
            None => props_from_attributes(block_type, schema, &DataAttributes(el)),
        };

        let content = match spec.config.content {
            ContentKind::Inline => {
                let nodes = match el.find(&|e| e.has_class(INLINE_CONTENT_CLASS)) {
                    Some(hole) => &hole.children,
                    None => &el.children,
                };
                Some(PartialContent::from(self.inline(nodes)))
            }
            ContentKind::Table => el
                .find(&|e| e.tag == "table")
                .map(|table| PartialContent::Table(self.table(table))),
            ContentKind::None => None,
        };

        let mut block = PartialBlock::new(block_type);
        block.props = Some(props);
        block.content = content;
        Some(block)
    }

    fn match_tag<'s>(&'s self, el: &Element, parent_tag: Option<&str>) -> Option<(&'s BlockSpec, Props)> {
        self.registry.blocks().find_map(|spec| {
            spec.node.parse_rules.iter().find_map(|rule| match rule {
                ParseRule::Tag { tag, within, props }
                    if *tag == el.tag && within.as_deref().is_none_or(|w| Some(w) == parent_tag) =>
                {
                    Some((spec, props.clone()))
                }
                _ => None,
            })
        })
    }

    /// A block from foreign markup. Lists nested inside become children.
    fn tag_block(&self, el: &Element, spec: &BlockSpec, rule_props: Props) -> PartialBlock {
        let block_type = spec.block_type();
        let mut props = props_from_attributes(block_type, &spec.config.prop_schema, &DataAttributes(el));
        props.extend(rule_props);

        let mut block = PartialBlock::new(block_type);
        block.props = Some(props);
        match spec.config.content {
            ContentKind::Table => block.content = Some(PartialContent::Table(self.table(el))),
            ContentKind::None => {}
            ContentKind::Inline => {
                let mut inline_nodes = Vec::new();
                let mut children = Vec::new();
                for child in &el.children {
                    match child {
                        DomNode::Element(c) if c.tag == "ul" || c.tag == "ol" => {
                            self.block_element(c, Some(&el.tag), &mut children)
                        }
                        DomNode::Element(c) if c.tag == "p" => {
                            inline_nodes.extend(c.children.iter().cloned())
                        }
                        other => inline_nodes.push(other.clone()),
                    }
                }
                block.content = Some(PartialContent::from(self.inline(&inline_nodes)));
                if !children.is_empty() {
                    block.children = Some(children);
                }
            }
        }
        block
    }

    fn inline(&self, nodes: &[DomNode]) -> Vec<InlineContent> {
        let mut out = Vec::new();
        self.collect_inline(nodes, &Styles::new(), None, &mut out);
        out
    }

    fn collect_inline(
        &self,
        nodes: &[DomNode],
        styles: &Styles,
        href: Option<&str>,
        out: &mut Vec<InlineContent>,
    ) {
        for node in nodes {
            match node {
                DomNode::Text(text) => push_inline(
                    out,
                    StyledText {
                        text: text.clone(),
                        styles: styles.clone(),
                    },
                    href.map(str::to_string),
                ),
                DomNode::Element(el) if el.tag == "br" => push_inline(
                    out,
                    StyledText {
                        text: "\n".to_string(),
                        styles: styles.clone(),
                    },
                    href.map(str::to_string),
                ),
                DomNode::Element(el) => {
                    let href = match (el.tag.as_str(), el.attr("href")) {
                        ("a", Some(target)) => Some(target),
                        _ => href,
                    };
                    match self.style_of(el) {
                        Some((style_type, value)) => {
                            let mut nested = styles.clone();
                            nested.insert(style_type, value);
                            self.collect_inline(&el.children, &nested, href, out);
                        }
                        None => self.collect_inline(&el.children, styles, href, out),
                    }
                }
            }
        }
    }

    /// The style an element applies, from `data-style-type` or a tag rule.
    fn style_of(&self, el: &Element) -> Option<(String, StyleValue)> {
        if let Some(style_type) = el.attr("data-style-type") {
            let spec = self.registry.style_spec(style_type)?;
            let value = match spec.config.prop_schema {
                StylePropSchema::Boolean => StyleValue::Flag(true),
                StylePropSchema::String => {
                    StyleValue::Value(el.attr("data-value").unwrap_or_default().to_string())
                }
            };
            return Some((style_type.to_string(), value));
        }
        self.registry
            .styles()
            .filter(|spec| spec.config.prop_schema == StylePropSchema::Boolean)
            .find(|spec| {
                spec.parse_rules
                    .iter()
                    .any(|rule| matches!(rule, ParseRule::Tag { tag, .. } if *tag == el.tag))
            })
            .map(|spec| (spec.style_type().to_string(), StyleValue::Flag(true)))
    }

    fn table(&self, table: &Element) -> TableContent {
        let mut rows = Vec::new();
        collect_rows(table, &mut rows);
        TableContent {
            kind: TableContentType::TableContent,
            rows: rows
                .into_iter()
                .map(|tr| TableRow {
                    cells: tr
                        .element_children()
                        .filter(|c| c.tag == "td" || c.tag == "th")
                        .map(|cell| self.inline(&cell.children))
                        .collect(),
                })
                .collect(),
        }
    }
}

fn collect_rows<'e>(el: &'e Element, rows: &mut Vec<&'e Element>) {
    for child in el.element_children() {
        if child.tag == "tr" {
            rows.push(child);
        } else if child.tag != "table" {
            collect_rows(child, rows);
        }
    }
}
