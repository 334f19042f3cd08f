//! Style edits over a character range of one block's inline content.
//!
//! Offsets count `char`s of the block's text, links included. Ranges past
//! the end are clamped.

use std::ops::Range;

use super::Editor;
use crate::convert::{marks_to_styles, sort_marks, style_mark};
use crate::error::{BlockError, Result};
use crate::model::{Block, Styles};
use crate::node::{Mark, Node, tree};
use crate::schema::ContentKind;

impl Editor {
    /// Sets each of `styles` on the range, replacing other values of the
    /// same string style.
    pub fn add_styles(&mut self, id: &str, range: Range<usize>, styles: &Styles) -> Result<Block> {
        let marks = self.marks_for(styles)?;
        self.edit_marks(id, range, "add_styles", |current| {
            for (style_type, mark) in &marks {
                current.retain(|m| m.mark_type != *style_type);
                current.extend(mark.clone());
            }
        })
    }

    /// Clears each style type in `styles` from the range. Values are ignored.
    pub fn remove_styles(&mut self, id: &str, range: Range<usize>, styles: &Styles) -> Result<Block> {
        for style_type in styles.keys() {
            self.registry.require_style(style_type)?;
        }
        self.edit_marks(id, range, "remove_styles", |current| {
            current.retain(|m| !styles.contains_key(&m.mark_type));
        })
    }

    /// Removes the styles the whole range already has with the same value
    /// and adds the rest.
    pub fn toggle_styles(&mut self, id: &str, range: Range<usize>, styles: &Styles) -> Result<Block> {
        let active = self.active_styles(id, range.clone())?;
        let (to_remove, to_add): (Styles, Styles) = styles
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .partition(|(style_type, value)| active.get(style_type) == Some(value));
        if !to_remove.is_empty() {
            self.remove_styles(id, range.clone(), &to_remove)?;
        }
        self.add_styles(id, range, &to_add)
    }

    /// Styles shared by every character of the range. An empty range reports
    /// the styles of the character before it, or after it at the start.
    pub fn active_styles(&self, id: &str, range: Range<usize>) -> Result<Styles> {
        let (_, content) = self.inline_node(id)?;
        let len = char_len(&content);
        let range = match (range.start.min(len), range.end.min(len)) {
            (start, end) if start < end => start..end,
            (0, _) => 0..len.min(1),
            (start, _) => start - 1..start,
        };

        let mut shared: Option<Styles> = None;
        for (node, inside) in split_text(content.content(), &range) {
            if !inside {
                continue;
            }
            let styles = marks_to_styles(node.marks(), &self.registry)?;
            shared = Some(match shared {
                None => styles,
                Some(mut acc) => {
                    acc.retain(|k, v| styles.get(k) == Some(v));
                    acc
                }
            });
        }
        Ok(shared.unwrap_or_default())
    }

    fn marks_for(&self, styles: &Styles) -> Result<Vec<(String, Option<Mark>)>> {
        styles
            .iter()
            .map(|(style_type, value)| {
                Ok((style_type.clone(), style_mark(style_type, value, &self.registry)?))
            })
            .collect()
    }

    /// Path and node of block `id`'s inline content node.
    fn inline_node(&self, id: &str) -> Result<(Vec<usize>, Node)> {
        let mut path = tree::find_container(&self.doc, id)
            .ok_or_else(|| BlockError::BlockNotFound(id.to_string()))?;
        path.push(0);
        let content = tree::node_at(&self.doc, &path)
            .cloned()
            .ok_or_else(|| BlockError::MalformedNode(format!("block `{id}` has no content node")))?;
        let spec = self.registry.require_block(content.type_name())?;
        if spec.config.content != ContentKind::Inline {
            return Err(BlockError::ContentMismatch {
                block_type: spec.block_type().to_string(),
                expected: ContentKind::Inline.as_str(),
            });
        }
        Ok((path, content))
    }

    fn edit_marks(
        &mut self,
        id: &str,
        range: Range<usize>,
        operation: &str,
        edit: impl Fn(&mut Vec<Mark>),
    ) -> Result<Block> {
        let (path, content) = self.inline_node(id)?;
        let len = char_len(&content);
        // A reversed range selects nothing.
        let start = range.start.min(len);
        let range = start..range.end.clamp(start, len);

        let mut edited: Vec<Node> = Vec::new();
        for (node, inside) in split_text(content.content(), &range) {
            let node = if inside {
                let mut marks = node.marks().to_vec();
                edit(&mut marks);
                sort_marks(&mut marks, &self.registry);
                node.with_marks(marks)
            } else {
                node
            };
            match edited.last_mut() {
                Some(prev) if prev.same_markup(&node) => {
                    let joined = format!(
                        "{}{}",
                        prev.text_value().unwrap_or_default(),
                        node.text_value().unwrap_or_default()
                    );
                    *prev = prev.with_text(joined);
                }
                _ => edited.push(node),
            }
        }

        let doc = tree::replace_at(&self.doc, &path, content.with_content(edited))?;
        self.after_mutation(doc, operation);
        self.get_block(id)
    }
}

fn char_len(content: &Node) -> usize {
    content
        .content()
        .iter()
        .filter_map(Node::text_value)
        .map(|t| t.chars().count())
        .sum()
}

/// Text nodes cut at the range boundaries, each flagged with whether it lies
/// inside the range.
fn split_text(nodes: &[Node], range: &Range<usize>) -> Vec<(Node, bool)> {
    let mut out = Vec::new();
    let mut offset = 0;
    for node in nodes {
        let Some(text) = node.text_value() else {
            out.push((node.clone(), false));
            continue;
        };
        let chars: Vec<char> = text.chars().collect();
        let (start, end) = (offset, offset + chars.len());
        offset = end;

        let cut_start = range.start.clamp(start, end) - start;
        let cut_end = range.end.clamp(start, end) - start;
        let pieces = [
            (0..cut_start, false),
            (cut_start..cut_end, true),
            (cut_end..chars.len(), false),
        ];
        for (span, inside) in pieces {
            if span.is_empty() {
                continue;
            }
            let piece: String = chars[span].iter().collect();
            out.push((node.with_text(piece), inside));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditorOptions;
    use crate::model::{BlockContent, InlineContent, PartialBlock, StyleValue, StyledText};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn styles(entries: &[(&'static str, StyleValue)]) -> Styles {
        entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn editor(content: Vec<InlineContent>) -> Editor {
        Editor::new(EditorOptions::default().with_initial_content(vec![
            PartialBlock::new("paragraph").with_id("p").with_content(content),
            PartialBlock::new("table").with_id("t"),
        ]))
        .unwrap()
    }

    fn content(block: &Block) -> Vec<InlineContent> {
        match &block.content {
            Some(BlockContent::Inline(items)) => items.clone(),
            other => panic!("expected inline content, got {other:?}"),
        }
    }

    #[test]
    fn test_add_style_splits_runs() {
        let mut editor = editor(vec![StyledText::plain("hello world").into()]);
        let bold = styles(&[("bold", StyleValue::Flag(true))]);
        let block = editor.add_styles("p", 6..11, &bold).unwrap();
        assert_eq!(
            content(&block),
            vec![
                StyledText::plain("hello ").into(),
                StyledText::styled("world", [("bold", StyleValue::Flag(true))]).into(),
            ]
        );
    }

    #[test]
    fn test_toggle_twice_restores_content() {
        let original = vec![StyledText::plain("héllo wörld").into()];
        let mut editor = editor(original.clone());
        let italic = styles(&[("italic", StyleValue::Flag(true))]);

        editor.toggle_styles("p", 2..8, &italic).unwrap();
        assert_eq!(editor.active_styles("p", 3..5).unwrap(), italic);
        let block = editor.toggle_styles("p", 2..8, &italic).unwrap();
        assert_eq!(content(&block), original);
    }

    #[test]
    fn test_string_style_value_is_replaced() {
        let mut editor = editor(vec![StyledText::plain("abc").into()]);
        editor
            .add_styles("p", 0..3, &styles(&[("textColor", StyleValue::from("red"))]))
            .unwrap();
        let block = editor
            .add_styles("p", 1..2, &styles(&[("textColor", StyleValue::from("blue"))]))
            .unwrap();
        assert_eq!(
            content(&block),
            vec![
                StyledText::styled("a", [("textColor", StyleValue::from("red"))]).into(),
                StyledText::styled("b", [("textColor", StyleValue::from("blue"))]).into(),
                StyledText::styled("c", [("textColor", StyleValue::from("red"))]).into(),
            ]
        );
    }

    #[test]
    fn test_active_styles_intersects_the_range() {
        let editor = editor(vec![
            StyledText::styled("ab", [("bold", StyleValue::Flag(true)), ("italic", StyleValue::Flag(true))]).into(),
            StyledText::styled("cd", [("bold", StyleValue::Flag(true))]).into(),
        ]);
        assert_eq!(
            editor.active_styles("p", 0..4).unwrap(),
            styles(&[("bold", StyleValue::Flag(true))])
        );
        assert_eq!(
            editor.active_styles("p", 2..2).unwrap(),
            styles(&[("bold", StyleValue::Flag(true)), ("italic", StyleValue::Flag(true))])
        );
    }

    #[rstest]
    #[case::reversed(3..1)]
    #[case::past_the_end(9..7)]
    #[case::empty(2..2)]
    fn test_empty_or_reversed_range_leaves_text_alone(#[case] range: Range<usize>) {
        let original = vec![StyledText::plain("hello").into()];
        let mut editor = editor(original.clone());
        let bold = styles(&[("bold", StyleValue::Flag(true))]);
        let block = editor.add_styles("p", range, &bold).unwrap();
        assert_eq!(content(&block), original);
    }

    #[test]
    fn test_style_edits_need_inline_content() {
        let mut editor = editor(vec![]);
        let err = editor
            .add_styles("t", 0..1, &styles(&[("bold", StyleValue::Flag(true))]))
            .unwrap_err();
        assert!(matches!(err, BlockError::ContentMismatch { expected: "inline", .. }));
        assert!(matches!(
            editor.add_styles("p", 0..1, &styles(&[("glow", StyleValue::Flag(true))])),
            Err(BlockError::UnknownStyle(_))
        ));
    }
}
