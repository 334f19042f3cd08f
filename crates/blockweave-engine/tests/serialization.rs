use blockweave_engine::codec::{attributes_from_props, props_from_attributes};
use blockweave_engine::convert::{BlockCache, block_to_node, node_to_block};
use blockweave_engine::dom::{Element, RenderSpec};
use blockweave_engine::node::Attrs;
use blockweave_engine::schema::PropSpec;
use blockweave_engine::{
    BlockContent, Editor, EditorOptions, InlineContent, Link, PartialBlock, PropSchema, PropValue,
    Props, SchemaBuilder, SchemaRegistry, StyleConfig, StyleValue, StyledText, create_style_spec,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn alert_schema() -> PropSchema {
    PropSchema::default_props()
        .with("kind", PropSpec::with_values("info", ["info", "warning", "error"]))
        .with("dismissible", PropSpec::new(false))
        .with("level", PropSpec::new(1i64))
}

fn sample_document() -> Vec<PartialBlock> {
    vec![
        PartialBlock::new("heading")
            .with_id("title")
            .with_prop("level", 2i64)
            .with_prop("textAlignment", "center")
            .with_content("Release notes"),
        PartialBlock::new("paragraph")
            .with_id("intro")
            .with_prop("textColor", "red")
            .with_content(vec![
                StyledText::plain("Read ").into(),
                StyledText::styled("this", [("bold", StyleValue::Flag(true))]).into(),
                StyledText::styled(
                    " first",
                    [("bold", StyleValue::Flag(true)), ("italic", StyleValue::Flag(true))],
                )
                .into(),
                InlineContent::Link(Link {
                    href: "https://example.com/notes".into(),
                    content: vec![StyledText::plain(" here")],
                }),
            ]),
        PartialBlock::new("bulletListItem")
            .with_id("item")
            .with_content("Parent item")
            .with_children(vec![
                PartialBlock::new("numberedListItem")
                    .with_id("nested")
                    .with_prop("backgroundColor", "yellow")
                    .with_content("Nested item"),
            ]),
    ]
}

fn editor(blocks: Vec<PartialBlock>) -> Editor {
    Editor::new(EditorOptions::default().with_initial_content(blocks)).unwrap()
}

#[rstest]
#[case::empty(Props::new())]
#[case::enum_value(Props::from([("kind".to_string(), PropValue::from("warning"))]))]
#[case::every_kind(Props::from([
    ("kind".to_string(), PropValue::from("error")),
    ("dismissible".to_string(), PropValue::Bool(true)),
    ("level".to_string(), PropValue::Number(3)),
    ("textColor".to_string(), PropValue::from("blue")),
]))]
fn test_props_round_trip_through_attributes(#[case] props: Props) {
    let schema = alert_schema();
    let attrs = attributes_from_props("alert", &schema, &props).unwrap();
    let decoded = props_from_attributes("alert", &schema, &attrs);

    let mut expected = schema.defaults();
    expected.extend(props);
    assert_eq!(decoded, expected);
}

#[test]
fn test_missing_attributes_decode_to_defaults() {
    let schema = alert_schema();
    assert_eq!(
        props_from_attributes("alert", &schema, &Attrs::new()),
        schema.defaults()
    );
}

#[test]
fn test_block_survives_node_round_trip() {
    let registry = SchemaRegistry::default();
    let editor = editor(sample_document());
    let mut cache = BlockCache::new();

    for block in editor.document().unwrap() {
        let node = block_to_node(&PartialBlock::from(block.clone()), &registry).unwrap();
        let again = node_to_block(&node, &registry, &mut cache).unwrap();
        assert_eq!(again, block);
    }
}

#[test]
fn test_internal_html_reimports_to_the_same_document() {
    let editor = editor(sample_document());
    let html = editor.to_internal_html().unwrap();
    assert_eq!(
        editor.try_parse_html_to_blocks(&html).unwrap(),
        editor.document().unwrap()
    );
}

#[test]
fn test_external_html_is_idempotent() {
    let editor = editor(sample_document());
    assert_eq!(
        editor.to_external_html().unwrap(),
        editor.to_external_html().unwrap()
    );
}

#[test]
fn test_default_props_are_not_rendered() {
    let editor = editor(vec![
        PartialBlock::new("paragraph")
            .with_id("plain")
            .with_prop("textColor", "default")
            .with_content("x"),
        PartialBlock::new("paragraph")
            .with_id("colored")
            .with_prop("textColor", "red")
            .with_prop("textAlignment", "right")
            .with_content("y"),
    ]);
    let html = editor.to_external_html().unwrap();
    let (plain, colored) = html.split_at(html.find(r#"data-id="colored""#).unwrap());

    assert!(!plain.contains("data-text-color"));
    assert!(!plain.contains("data-text-alignment"));
    assert!(!plain.contains("data-background-color"));
    assert!(colored.contains(r#"data-text-color="red""#));
    assert!(colored.contains(r#"data-text-alignment="right""#));
}

#[test]
fn test_nested_block_follows_parent_content_in_html() {
    let editor = editor(sample_document());
    let html = editor.to_external_html().unwrap();

    let parent_content = html.find("Parent item").unwrap();
    let nested_group = html[parent_content..]
        .find(r#"data-node-type="blockGroup""#)
        .map(|i| i + parent_content)
        .unwrap();
    let child_content = html.find("Nested item").unwrap();
    assert!(parent_content < nested_group);
    assert!(nested_group < child_content);
    assert!(html[nested_group..].contains(r#"data-id="nested""#));
}

#[test]
fn test_font_size_style_in_html_and_json() {
    let schema = SchemaBuilder::new().style(create_style_spec(
        StyleConfig::string("fontSize"),
        |value| {
            RenderSpec::wrapper(
                Element::new("span")
                    .with_attr("style", format!("font-size: {}", value.unwrap_or_default())),
            )
        },
    ));
    let editor = Editor::new(
        EditorOptions::default()
            .with_schema(schema)
            .with_initial_content(vec![PartialBlock::new("paragraph").with_id("p").with_content(
                vec![StyledText::styled("large text", [("fontSize", StyleValue::from("30px"))]).into()],
            )]),
    )
    .unwrap();

    let html = editor.to_external_html().unwrap();
    assert!(html.contains(r#"style="font-size: 30px""#));
    assert!(html.contains(">large text</span>"));

    let block = editor.get_block("p").unwrap();
    let Some(BlockContent::Inline(content)) = &block.content else {
        panic!("expected inline content");
    };
    assert_eq!(
        serde_json::to_value(&content[0]).unwrap(),
        serde_json::json!({"type": "text", "text": "large text", "styles": {"fontSize": "30px"}})
    );
}
