//! # Markdown conversion
//!
//! Lossy in both directions. Export keeps headings, list nesting, tables,
//! links and the styles Markdown has syntax for (bold, italic, strike and
//! code); everything else is written as plain text. Import maps the same
//! constructs back onto whichever of the default block and style types the
//! registry declares.
//!
//! ## Pulldown-cmark event flow
//!
//! Both directions work on `pulldown_cmark` events. A nested list arrives
//! inside its parent item, after the item's own text:
//!
//! ```text
//! Start(List) Start(Item) Text("parent")
//!     Start(List) Start(Item) Text("child") End(Item) End(List)
//! End(Item) End(List)
//! ```
//!
//! so the reader keeps a stack of open blocks and attaches each finished
//! block to whatever is open below it.

use pulldown_cmark::{Alignment, CowStr, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd};
use pulldown_cmark_to_cmark::cmark;

use crate::convert::push_inline;
use crate::error::{BlockError, Result};
use crate::model::{
    Block, BlockContent, InlineContent, PartialBlock, PartialContent, StyleValue, StyledText,
    Styles, TableContent, TableContentType, TableRow,
};
use crate::schema::{ContentKind, PropValue, Props, SchemaRegistry};

const BULLET_ITEM: &str = "bulletListItem";
const NUMBERED_ITEM: &str = "numberedListItem";
const HEADING: &str = "heading";
const TABLE: &str = "table";

/// Styles with Markdown syntax, outermost first.
const EMPHASIS_STYLES: &[&str] = &["bold", "italic", "strike"];

/// Writes `blocks` as CommonMark.
///
/// List items group into lists; children of any other block follow it at
/// the same level.
pub fn blocks_to_markdown(blocks: &[Block]) -> Result<String> {
    let mut writer = MarkdownWriter { events: Vec::new() };
    writer.blocks(blocks);

    let mut out = String::new();
    cmark(writer.events.iter(), &mut out).map_err(|e| BlockError::Markdown(format!("{e:?}")))?;
    Ok(out)
}

struct MarkdownWriter {
    events: Vec<Event<'static>>,
}

fn list_kind(block_type: &str) -> Option<bool> {
    match block_type {
        BULLET_ITEM => Some(false),
        NUMBERED_ITEM => Some(true),
        _ => None,
    }
}

fn inline_of(block: &Block) -> &[InlineContent] {
    block
        .content
        .as_ref()
        .and_then(BlockContent::inline)
        .unwrap_or(&[])
}

impl MarkdownWriter {
    fn blocks(&mut self, blocks: &[Block]) {
        let mut i = 0;
        while i < blocks.len() {
            match list_kind(&blocks[i].block_type) {
                Some(ordered) => {
                    let end = blocks[i..]
                        .iter()
                        .position(|b| list_kind(&b.block_type) != Some(ordered))
                        .map_or(blocks.len(), |n| i + n);
                    self.list(&blocks[i..end], ordered);
                    i = end;
                }
                None => {
                    self.block(&blocks[i]);
                    i += 1;
                }
            }
        }
    }

    fn list(&mut self, items: &[Block], ordered: bool) {
        self.events.push(Event::Start(Tag::List(ordered.then_some(1))));
        for item in items {
            self.events.push(Event::Start(Tag::Item));
            self.inline(inline_of(item));
            self.blocks(&item.children);
            self.events.push(Event::End(TagEnd::Item));
        }
        self.events.push(Event::End(TagEnd::List(ordered)));
    }

    fn block(&mut self, block: &Block) {
        match (block.block_type.as_str(), &block.content) {
            (HEADING, Some(BlockContent::Inline(content))) => {
                let level = block
                    .props
                    .get("level")
                    .and_then(|v| v.as_number())
                    .and_then(|n| usize::try_from(n).ok())
                    .and_then(|n| HeadingLevel::try_from(n).ok())
                    .unwrap_or(HeadingLevel::H1);
                self.events.push(Event::Start(Tag::Heading {
                    level,
                    id: None,
                    classes: Vec::new(),
                    attrs: Vec::new(),
                }));
                self.inline(content);
                self.events.push(Event::End(TagEnd::Heading(level)));
            }
            (_, Some(BlockContent::Inline(content))) if !content.is_empty() => {
                self.events.push(Event::Start(Tag::Paragraph));
                self.inline(content);
                self.events.push(Event::End(TagEnd::Paragraph));
            }
            (_, Some(BlockContent::Table(table))) => self.table(table),
            _ => log::trace!("no markdown for empty `{}` block {}", block.block_type, block.id),
        }
        self.blocks(&block.children);
    }

    fn table(&mut self, table: &TableContent) {
        let columns = table.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
        if columns == 0 {
            return;
        }
        self.events
            .push(Event::Start(Tag::Table(vec![Alignment::None; columns])));
        for (index, row) in table.rows.iter().enumerate() {
            let (start, end) = if index == 0 {
                (Tag::TableHead, TagEnd::TableHead)
            } else {
                (Tag::TableRow, TagEnd::TableRow)
            };
            self.events.push(Event::Start(start));
            for column in 0..columns {
                self.events.push(Event::Start(Tag::TableCell));
                self.inline(row.cells.get(column).map(Vec::as_slice).unwrap_or(&[]));
                self.events.push(Event::End(TagEnd::TableCell));
            }
            self.events.push(Event::End(end));
        }
        self.events.push(Event::End(TagEnd::Table));
    }

    fn inline(&mut self, content: &[InlineContent]) {
        for item in content {
            match item {
                InlineContent::Text(run) => self.run(run),
                InlineContent::Link(link) => {
                    self.events.push(Event::Start(Tag::Link {
                        link_type: LinkType::Inline,
                        dest_url: CowStr::from(link.href.clone()),
                        title: CowStr::from(""),
                        id: CowStr::from(""),
                    }));
                    for run in &link.content {
                        self.run(run);
                    }
                    self.events.push(Event::End(TagEnd::Link));
                }
            }
        }
    }

    fn run(&mut self, run: &StyledText) {
        let emphasis: Vec<&str> = EMPHASIS_STYLES
            .iter()
            .copied()
            .filter(|style| run.styles.get(*style) == Some(&StyleValue::Flag(true)))
            .collect();
        for style in &emphasis {
            self.events.push(Event::Start(emphasis_tag(style)));
        }
        if run.styles.get("code") == Some(&StyleValue::Flag(true)) {
            self.events.push(Event::Code(CowStr::from(run.text.clone())));
        } else {
            for (index, line) in run.text.split('\n').enumerate() {
                if index > 0 {
                    self.events.push(Event::HardBreak);
                }
                if !line.is_empty() {
                    self.events.push(Event::Text(CowStr::from(line.to_string())));
                }
            }
        }
        for style in emphasis.iter().rev() {
            self.events.push(Event::End(emphasis_tag(style).to_end()));
        }
    }
}

fn emphasis_tag(style: &str) -> Tag<'static> {
    match style {
        "bold" => Tag::Strong,
        "italic" => Tag::Emphasis,
        _ => Tag::Strikethrough,
    }
}

/// Reads CommonMark (with tables and strikethrough) into partial blocks.
///
/// Headings deeper than level 3 become level 3 and code blocks become
/// paragraphs. Styles the registry does not declare are dropped.
pub fn markdown_to_blocks(markdown: &str, registry: &SchemaRegistry) -> Vec<PartialBlock> {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
    let mut reader = MarkdownReader::new(registry);
    for event in parser {
        reader.process_event(event);
    }
    reader.finalize()
}

/// A block being read, closed by the matching end event.
struct OpenBlock {
    block: PartialBlock,
    inline: Vec<InlineContent>,
    children: Vec<PartialBlock>,
    is_item: bool,
}

struct TableBuilder {
    rows: Vec<TableRow>,
    cell: Option<Vec<InlineContent>>,
}

struct MarkdownReader<'r> {
    registry: &'r SchemaRegistry,
    blocks: Vec<PartialBlock>,
    open: Vec<OpenBlock>,
    /// Whether each open paragraph opened its own block or wrote into a list item.
    paragraphs: Vec<bool>,
    /// Ordered flag of each open list.
    lists: Vec<bool>,
    styles: Styles,
    href: Option<String>,
    table: Option<TableBuilder>,
}

impl<'r> MarkdownReader<'r> {
    fn new(registry: &'r SchemaRegistry) -> Self {
        Self {
            registry,
            blocks: Vec::new(),
            open: Vec::new(),
            paragraphs: Vec::new(),
            lists: Vec::new(),
            styles: Styles::new(),
            href: None,
            table: None,
        }
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(Tag::Paragraph) => {
                let into_item = self
                    .open
                    .last()
                    .is_some_and(|top| top.is_item && top.inline.is_empty() && top.children.is_empty());
                self.paragraphs.push(!into_item);
                if !into_item {
                    self.start_block(self.registry.default_block_type().to_string(), false);
                }
            }
            Event::End(TagEnd::Paragraph) => {
                if self.paragraphs.pop() == Some(true) {
                    self.end_block();
                }
            }
            Event::Start(Tag::Heading { level, .. }) => {
                let block_type = self.resolve(HEADING);
                let is_heading = block_type == HEADING;
                self.start_block(block_type, false);
                if is_heading && let Some(top) = self.open.last_mut() {
                    top.block
                        .props
                        .get_or_insert_with(Props::new)
                        .insert("level".to_string(), PropValue::Number((level as i64).min(3)));
                }
            }
            Event::End(TagEnd::Heading(_)) => self.end_block(),
            Event::Start(Tag::List(first)) => self.lists.push(first.is_some()),
            Event::End(TagEnd::List(_)) => {
                self.lists.pop();
            }
            Event::Start(Tag::Item) => {
                let wanted = if self.lists.last() == Some(&true) {
                    NUMBERED_ITEM
                } else {
                    BULLET_ITEM
                };
                let block_type = self.resolve(wanted);
                self.start_block(block_type, true);
            }
            Event::End(TagEnd::Item) => self.end_block(),
            Event::Start(Tag::CodeBlock(_)) => {
                self.start_block(self.registry.default_block_type().to_string(), false);
                self.set_style("code", true);
            }
            Event::End(TagEnd::CodeBlock) => {
                self.set_style("code", false);
                if let Some(top) = self.open.last_mut()
                    && let Some(InlineContent::Text(last)) = top.inline.last_mut()
                {
                    let trimmed = last.text.trim_end_matches('\n').len();
                    last.text.truncate(trimmed);
                }
                self.end_block();
            }
            Event::Start(Tag::Table(_)) => {
                self.table = Some(TableBuilder {
                    rows: Vec::new(),
                    cell: None,
                });
            }
            Event::Start(Tag::TableHead) | Event::Start(Tag::TableRow) => {
                if let Some(table) = &mut self.table {
                    table.rows.push(TableRow::default());
                }
            }
            Event::Start(Tag::TableCell) => {
                if let Some(table) = &mut self.table {
                    table.cell = Some(Vec::new());
                }
            }
            Event::End(TagEnd::TableCell) => {
                if let Some(table) = &mut self.table
                    && let Some(cell) = table.cell.take()
                    && let Some(row) = table.rows.last_mut()
                {
                    row.cells.push(cell);
                }
            }
            Event::End(TagEnd::Table) => self.end_table(),
            Event::Start(Tag::Strong) => self.set_style("bold", true),
            Event::End(TagEnd::Strong) => self.set_style("bold", false),
            Event::Start(Tag::Emphasis) => self.set_style("italic", true),
            Event::End(TagEnd::Emphasis) => self.set_style("italic", false),
            Event::Start(Tag::Strikethrough) => self.set_style("strike", true),
            Event::End(TagEnd::Strikethrough) => self.set_style("strike", false),
            Event::Start(Tag::Link { dest_url, .. }) => self.href = Some(dest_url.to_string()),
            Event::End(TagEnd::Link) => self.href = None,
            Event::Text(text) => self.push_text(&text, self.styles.clone()),
            Event::Code(code) => {
                let mut styles = self.styles.clone();
                if self.registry.style_spec("code").is_some() {
                    styles.insert("code".to_string(), StyleValue::Flag(true));
                }
                self.push_text(&code, styles);
            }
            Event::SoftBreak => self.push_text(" ", self.styles.clone()),
            Event::HardBreak => self.push_text("\n", self.styles.clone()),
            _ => {}
        }
    }

    /// `wanted` when registered, otherwise the default block type.
    fn resolve(&self, wanted: &str) -> String {
        match self.registry.block_spec(wanted) {
            Some(_) => wanted.to_string(),
            None => self.registry.default_block_type().to_string(),
        }
    }

    fn set_style(&mut self, style_type: &str, on: bool) {
        if self.registry.style_spec(style_type).is_none() {
            return;
        }
        if on {
            self.styles
                .insert(style_type.to_string(), StyleValue::Flag(true));
        } else {
            self.styles.remove(style_type);
        }
    }

    fn push_text(&mut self, text: &str, styles: Styles) {
        let run = StyledText {
            text: text.to_string(),
            styles,
        };
        let href = self.href.clone();
        if let Some(table) = &mut self.table
            && let Some(cell) = &mut table.cell
        {
            push_inline(cell, run, href);
        } else if let Some(top) = self.open.last_mut() {
            push_inline(&mut top.inline, run, href);
        } else {
            log::trace!("dropping markdown text outside any block: {text:?}");
        }
    }

    fn start_block(&mut self, block_type: String, is_item: bool) {
        self.open.push(OpenBlock {
            block: PartialBlock::new(block_type),
            inline: Vec::new(),
            children: Vec::new(),
            is_item,
        });
    }

    fn end_block(&mut self) {
        let Some(open) = self.open.pop() else {
            return;
        };
        let mut block = open.block;
        let kind = self
            .registry
            .block_spec(&block.block_type)
            .map(|spec| spec.config.content);
        if kind == Some(ContentKind::Inline) {
            block.content = Some(PartialContent::from(open.inline));
        }
        if !open.children.is_empty() {
            block.children = Some(open.children);
        }
        self.attach(block);
    }

    fn end_table(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };
        if self.registry.block_spec(TABLE).is_none() {
            log::warn!("dropping markdown table: no `{TABLE}` block registered");
            return;
        }
        let block = PartialBlock::new(TABLE).with_content(PartialContent::Table(TableContent {
            kind: TableContentType::TableContent,
            rows: table.rows,
        }));
        self.attach(block);
    }

    fn attach(&mut self, block: PartialBlock) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(block),
            None => self.blocks.push(block),
        }
    }

    fn finalize(mut self) -> Vec<PartialBlock> {
        while !self.open.is_empty() {
            self.end_block();
        }
        self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Link, PartialInlineContent};
    use pretty_assertions::assert_eq;

    fn block(block_type: &str, content: Vec<InlineContent>, children: Vec<Block>) -> Block {
        Block {
            id: "id".into(),
            block_type: block_type.into(),
            props: Props::new(),
            content: Some(BlockContent::Inline(content)),
            children,
        }
    }

    fn plain(text: &str) -> InlineContent {
        StyledText::plain(text).into()
    }

    fn inline(block: &PartialBlock) -> Vec<InlineContent> {
        match block.content.clone() {
            Some(PartialContent::Inline(items)) => {
                items.into_iter().map(PartialInlineContent::into_inline).collect()
            }
            other => panic!("expected inline content, got {other:?}"),
        }
    }

    #[test]
    fn test_markdown_export_keeps_structure() {
        let registry = SchemaRegistry::default();
        let mut heading = block("heading", vec![plain("Title")], vec![]);
        heading.props.insert("level".into(), PropValue::Number(2));
        let blocks = vec![
            heading,
            block(
                "paragraph",
                vec![
                    plain("Some "),
                    StyledText::styled("bold", [("bold", StyleValue::Flag(true))]).into(),
                    plain(" and "),
                    InlineContent::Link(Link {
                        href: "https://example.com".into(),
                        content: vec![StyledText::plain("a site")],
                    }),
                ],
                vec![],
            ),
            block(
                "bulletListItem",
                vec![plain("one")],
                vec![block("bulletListItem", vec![plain("nested")], vec![])],
            ),
            block("bulletListItem", vec![plain("two")], vec![]),
        ];

        let md = blocks_to_markdown(&blocks).unwrap();
        assert!(md.contains("## Title"), "{md}");
        assert!(md.contains("**bold**"), "{md}");
        assert!(md.contains("[a site](https://example.com)"), "{md}");

        let back = markdown_to_blocks(&md, &registry);
        let types: Vec<&str> = back.iter().map(|b| b.block_type.as_str()).collect();
        assert_eq!(types, vec!["heading", "paragraph", "bulletListItem", "bulletListItem"]);
        let nested = back[2].children.as_ref().unwrap();
        assert_eq!(inline(&nested[0]), vec![plain("nested")]);
        assert_eq!(inline(&back[3]), vec![plain("two")]);
    }

    #[test]
    fn test_markdown_import() {
        let registry = SchemaRegistry::default();
        let md = "# Title\n\nSome **bold** and *it*\n\n- a\n  - b\n- c\n\n1. first\n\n| x | y |\n|---|---|\n| 1 | 2 |\n";
        let blocks = markdown_to_blocks(md, &registry);

        let types: Vec<&str> = blocks.iter().map(|b| b.block_type.as_str()).collect();
        assert_eq!(
            types,
            vec!["heading", "paragraph", "bulletListItem", "bulletListItem", "numberedListItem", "table"]
        );
        assert_eq!(blocks[0].props.as_ref().unwrap()["level"], PropValue::Number(1));
        assert_eq!(
            inline(&blocks[1]),
            vec![
                plain("Some "),
                StyledText::styled("bold", [("bold", StyleValue::Flag(true))]).into(),
                plain(" and "),
                StyledText::styled("it", [("italic", StyleValue::Flag(true))]).into(),
            ]
        );
        assert_eq!(inline(&blocks[2].children.as_ref().unwrap()[0]), vec![plain("b")]);
        assert_eq!(
            blocks[5].content,
            Some(PartialContent::Table(TableContent::from_text_rows([["x", "y"], ["1", "2"]])))
        );
    }

    #[test]
    fn test_deep_headings_clamp_to_level_three() {
        let registry = SchemaRegistry::default();
        let blocks = markdown_to_blocks("##### Deep", &registry);
        assert_eq!(blocks[0].props.as_ref().unwrap()["level"], PropValue::Number(3));
    }

    #[test]
    fn test_code_block_becomes_code_styled_paragraph() {
        let registry = SchemaRegistry::default();
        let blocks = markdown_to_blocks("```\nlet x = 1;\n```\n", &registry);
        assert_eq!(blocks[0].block_type, "paragraph");
        assert_eq!(
            inline(&blocks[0]),
            vec![StyledText::styled("let x = 1;", [("code", StyleValue::Flag(true))]).into()]
        );
    }
}
