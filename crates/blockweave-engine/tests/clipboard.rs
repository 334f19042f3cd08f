use blockweave_engine::clipboard::{DEFAULT_BLOCKS_MIME, HTML_MIME, PLAIN_MIME};
use blockweave_engine::{
    Block, Clipboard, ClipboardPayload, Editor, EditorOptions, MemoryClipboard, PartialBlock,
    StyleValue, StyledText,
};
use pretty_assertions::assert_eq;

fn two_paragraphs() -> Editor {
    Editor::new(EditorOptions::default().with_initial_content(vec![
        PartialBlock::new("paragraph")
            .with_id("first")
            .with_prop("textColor", "blue")
            .with_content(vec![
                StyledText::plain("Hello ").into(),
                StyledText::styled("world", [("bold", StyleValue::Flag(true))]).into(),
            ]),
        PartialBlock::new("paragraph")
            .with_id("second")
            .with_content("Goodbye"),
    ]))
    .unwrap()
}

fn without_id(block: &Block) -> Block {
    Block {
        id: String::new(),
        children: block.children.iter().map(without_id).collect(),
        ..block.clone()
    }
}

#[test]
fn test_two_block_copy_and_paste() {
    let mut editor = two_paragraphs();
    let source = editor.document().unwrap();
    editor.set_selection("first", "second").unwrap();

    let mut clipboard = MemoryClipboard::new();
    assert!(editor.copy(&mut clipboard).unwrap());

    let payload = clipboard.read().unwrap();
    let copied: Vec<Block> = serde_json::from_str(payload.get(DEFAULT_BLOCKS_MIME).unwrap()).unwrap();
    assert_eq!(copied, source);

    editor.set_text_cursor("second").unwrap();
    let pasted = editor.paste(&mut clipboard).unwrap();
    assert_eq!(pasted.len(), 2);
    assert_eq!(
        pasted.iter().map(without_id).collect::<Vec<_>>(),
        source.iter().map(without_id).collect::<Vec<_>>()
    );
    for block in &pasted {
        assert!(!source.iter().any(|s| s.id == block.id));
    }
    assert_eq!(editor.document().unwrap().len(), 4);
}

#[test]
fn test_plain_text_part_is_markdown() {
    let mut editor = two_paragraphs();
    editor.set_selection("first", "second").unwrap();
    let mut clipboard = MemoryClipboard::new();
    editor.copy(&mut clipboard).unwrap();

    let payload = clipboard.contents().unwrap();
    let plain = payload.get(PLAIN_MIME).unwrap();
    assert!(plain.contains("Hello **world**"));
    assert!(plain.trim_end().ends_with("Goodbye"));
    assert!(payload.get(HTML_MIME).unwrap().contains(r#"data-content-type="paragraph""#));
}

#[test]
fn test_custom_mime_type_is_honoured() {
    let mut editor = Editor::new(
        EditorOptions::default()
            .with_clipboard_mime_type("application/x-notes")
            .with_initial_content(vec![
                PartialBlock::new("paragraph").with_id("a").with_content("a"),
                PartialBlock::new("paragraph").with_id("b").with_content("b"),
            ]),
    )
    .unwrap();
    editor.set_selection("a", "b").unwrap();
    let mut clipboard = MemoryClipboard::new();
    editor.copy(&mut clipboard).unwrap();

    let payload = clipboard.contents().unwrap();
    assert!(payload.get("application/x-notes").is_some());
    assert!(payload.get(DEFAULT_BLOCKS_MIME).is_none());
}

#[test]
fn test_paste_between_editors_regenerates_nested_ids() {
    let source = Editor::new(EditorOptions::default().with_initial_content(vec![
        PartialBlock::new("bulletListItem")
            .with_id("parent")
            .with_content("parent")
            .with_children(vec![
                PartialBlock::new("bulletListItem").with_id("child").with_content("child"),
            ]),
    ]))
    .unwrap();
    let payload = source.clipboard_payload(&source.document().unwrap()).unwrap();

    let mut target = two_paragraphs();
    let mut clipboard = MemoryClipboard::with_contents(payload);
    let pasted = target.paste(&mut clipboard).unwrap();

    assert_eq!(pasted.len(), 1);
    assert_ne!(pasted[0].id, "parent");
    assert_ne!(pasted[0].children[0].id, "child");
    assert_eq!(target.document().unwrap()[1].id, pasted[0].id);
}

#[test]
fn test_markdown_round_trip_keeps_structure() {
    let editor = Editor::new(EditorOptions::default().with_initial_content(vec![
        PartialBlock::new("heading").with_prop("level", 1i64).with_content("Title"),
        PartialBlock::new("paragraph").with_content(vec![
            StyledText::plain("plain and ").into(),
            StyledText::styled("italic", [("italic", StyleValue::Flag(true))]).into(),
        ]),
        PartialBlock::new("numberedListItem").with_content("one"),
        PartialBlock::new("numberedListItem").with_content("two"),
    ]))
    .unwrap();

    let markdown = editor.to_markdown().unwrap();
    let reparsed = editor.try_parse_markdown_to_blocks(&markdown).unwrap();
    let original = editor.document().unwrap();

    assert_eq!(reparsed.len(), original.len());
    for (a, b) in reparsed.iter().zip(&original) {
        assert_eq!(a.block_type, b.block_type);
        assert_eq!(a.props, b.props);
        assert_eq!(a.content, b.content);
    }
}

#[test]
fn test_empty_payload_is_an_error() {
    let mut editor = two_paragraphs();
    let mut clipboard = MemoryClipboard::with_contents(ClipboardPayload::new());
    assert!(editor.paste(&mut clipboard).is_err());
}
