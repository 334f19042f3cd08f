use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Styles applied to a text run, keyed by style type.
pub type Styles = BTreeMap<String, StyleValue>;

/// Value of one style on a run: `true` for flag styles, a string otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Flag(bool),
    Value(String),
}

impl StyleValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StyleValue::Value(v) => Some(v),
            StyleValue::Flag(_) => None,
        }
    }
}

impl From<bool> for StyleValue {
    fn from(value: bool) -> Self {
        StyleValue::Flag(value)
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        StyleValue::Value(value.to_string())
    }
}

/// A run of text sharing one set of styles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "text")]
pub struct StyledText {
    pub text: String,
    #[serde(default)]
    pub styles: Styles,
}

impl StyledText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            styles: Styles::new(),
        }
    }

    pub fn styled(text: impl Into<String>, styles: impl IntoIterator<Item = (&'static str, StyleValue)>) -> Self {
        Self {
            text: text.into(),
            styles: styles
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

/// A hyperlink wrapping styled runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "link")]
pub struct Link {
    pub href: String,
    pub content: Vec<StyledText>,
}

/// One item of a block's inline content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InlineContent {
    Text(StyledText),
    Link(Link),
}

impl InlineContent {
    /// Concatenated text of the item.
    pub fn text(&self) -> String {
        match self {
            InlineContent::Text(t) => t.text.clone(),
            InlineContent::Link(link) => link.content.iter().map(|t| t.text.as_str()).collect(),
        }
    }
}

impl From<StyledText> for InlineContent {
    fn from(text: StyledText) -> Self {
        InlineContent::Text(text)
    }
}

/// Inline content as callers may supply it: a bare string is an unstyled run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PartialInlineContent {
    Plain(String),
    Content(InlineContent),
}

impl PartialInlineContent {
    pub fn into_inline(self) -> InlineContent {
        match self {
            PartialInlineContent::Plain(text) => InlineContent::Text(StyledText::plain(text)),
            PartialInlineContent::Content(content) => content,
        }
    }
}

impl From<InlineContent> for PartialInlineContent {
    fn from(content: InlineContent) -> Self {
        PartialInlineContent::Content(content)
    }
}

/// Plain text of a run sequence.
pub fn inline_text(content: &[InlineContent]) -> String {
    content.iter().map(InlineContent::text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_styled_text_json_shape() {
        let run = StyledText::styled("large text", [("fontSize", StyleValue::from("30px"))]);
        let json = serde_json::to_value(InlineContent::Text(run.clone())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "text", "text": "large text", "styles": {"fontSize": "30px"}})
        );
        let back: InlineContent = serde_json::from_value(json).unwrap();
        assert_eq!(back, InlineContent::Text(run));
    }

    #[test]
    fn test_link_is_distinguished_from_text() {
        let json = serde_json::json!({
            "type": "link",
            "href": "https://example.com",
            "content": [{"type": "text", "text": "site", "styles": {"bold": true}}]
        });
        let parsed: InlineContent = serde_json::from_value(json).unwrap();
        let InlineContent::Link(link) = parsed else {
            panic!("expected a link");
        };
        assert_eq!(link.href, "https://example.com");
        assert_eq!(link.content[0].styles["bold"], StyleValue::Flag(true));
    }

    #[test]
    fn test_partial_inline_accepts_strings() {
        let parsed: Vec<PartialInlineContent> =
            serde_json::from_str(r#"["hello ", {"type": "text", "text": "world"}]"#).unwrap();
        let content: Vec<InlineContent> = parsed.into_iter().map(|p| p.into_inline()).collect();
        assert_eq!(inline_text(&content), "hello world");
    }
}
