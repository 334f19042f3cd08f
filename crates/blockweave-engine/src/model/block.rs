use serde::{Deserialize, Serialize};

use crate::model::inline::{InlineContent, PartialInlineContent, StyledText};
use crate::schema::Props;

/// A block as seen through the JSON API.
///
/// Always derived from the node tree: every read builds a fresh value, so
/// mutating a `Block` never touches the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: String,
    pub props: Props,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<BlockContent>,
    #[serde(default)]
    pub children: Vec<Block>,
}

/// Content of a block: inline runs or a table. Absent for `content: none` blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockContent {
    Inline(Vec<InlineContent>),
    Table(TableContent),
}

impl BlockContent {
    pub fn inline(&self) -> Option<&[InlineContent]> {
        match self {
            BlockContent::Inline(content) => Some(content),
            BlockContent::Table(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableContentType {
    #[default]
    #[serde(rename = "tableContent")]
    TableContent,
}

/// Rows of cells, each cell holding inline content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableContent {
    #[serde(rename = "type", default)]
    pub kind: TableContentType,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<Vec<InlineContent>>,
}

impl TableContent {
    pub fn from_text_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = &'static str>,
    {
        Self {
            kind: TableContentType::TableContent,
            rows: rows
                .into_iter()
                .map(|cells| TableRow {
                    cells: cells
                        .into_iter()
                        .map(|text| {
                            if text.is_empty() {
                                Vec::new()
                            } else {
                                vec![InlineContent::Text(StyledText::plain(text))]
                            }
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Block content as callers may supply it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PartialContent {
    Text(String),
    Inline(Vec<PartialInlineContent>),
    Table(TableContent),
}

impl From<BlockContent> for PartialContent {
    fn from(content: BlockContent) -> Self {
        match content {
            BlockContent::Inline(items) => {
                PartialContent::Inline(items.into_iter().map(Into::into).collect())
            }
            BlockContent::Table(table) => PartialContent::Table(table),
        }
    }
}

impl From<&str> for PartialContent {
    fn from(text: &str) -> Self {
        PartialContent::Text(text.to_string())
    }
}

impl From<String> for PartialContent {
    fn from(text: String) -> Self {
        PartialContent::Text(text)
    }
}

impl From<Vec<InlineContent>> for PartialContent {
    fn from(items: Vec<InlineContent>) -> Self {
        PartialContent::Inline(items.into_iter().map(Into::into).collect())
    }
}

/// A block description used for inserts and updates. Only `type` is required;
/// everything else overrides what a prior block or the schema defaults
/// would give.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Props>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<PartialContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<PartialBlock>>,
}

impl PartialBlock {
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            id: None,
            block_type: block_type.into(),
            props: None,
            content: None,
            children: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<crate::schema::PropValue>) -> Self {
        self.props
            .get_or_insert_with(Props::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<PartialContent>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_children(mut self, children: Vec<PartialBlock>) -> Self {
        self.children = Some(children);
        self
    }

    /// The same block without its id, children stripped recursively too.
    ///
    /// Used by paste so inserted blocks receive fresh ids.
    pub fn without_ids(mut self) -> Self {
        self.id = None;
        self.children = self
            .children
            .map(|children| children.into_iter().map(PartialBlock::without_ids).collect());
        self
    }
}

impl From<Block> for PartialBlock {
    fn from(block: Block) -> Self {
        Self {
            id: Some(block.id),
            block_type: block.block_type,
            props: Some(block.props),
            content: block.content.map(Into::into),
            children: Some(block.children.into_iter().map(Into::into).collect()),
        }
    }
}
