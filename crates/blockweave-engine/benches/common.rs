// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use blockweave_engine::{PartialBlock, StyleValue, StyledText};

#[allow(dead_code)]
pub fn generate_markdown_content(size: usize) -> String {
    let base = "# Title\n\n## Section\n\nParagraph with **some** content.\n\n- Bullet point\n  - Nested item\n- Another item\n\n1. First\n2. Second\n\n";
    base.repeat(size)
}

/// `sections` headings, each followed by a paragraph and a list nested
/// `depth` levels deep.
#[allow(dead_code)]
pub fn generate_blocks(sections: usize, depth: usize) -> Vec<PartialBlock> {
    let mut blocks = Vec::new();
    for section in 0..sections {
        blocks.push(
            PartialBlock::new("heading")
                .with_prop("level", 2i64)
                .with_content(format!("Section {section}")),
        );
        blocks.push(PartialBlock::new("paragraph").with_content(vec![
            StyledText::plain("Some paragraph content with ").into(),
            StyledText::styled("bold", [("bold", StyleValue::Flag(true))]).into(),
            StyledText::plain(" text.").into(),
        ]));
        blocks.push(nested_item(depth));
    }
    blocks
}

#[allow(dead_code)]
fn nested_item(remaining_depth: usize) -> PartialBlock {
    let item = PartialBlock::new("bulletListItem")
        .with_content(format!("Item at depth {remaining_depth}"));
    if remaining_depth == 0 {
        return item;
    }
    item.with_children(vec![nested_item(remaining_depth - 1)])
}
