//! Default block and style specs, and the structural node types every
//! schema shares.

use std::rc::Rc;

use crate::codec::{inherited_external_attributes, props_from_attributes};
use crate::dom::{Element, RenderSpec};
use crate::node::{BLOCK_CONTAINER, BLOCK_GROUP, Node, TABLE_CELL, TABLE_ROW};
use crate::schema::{
    BlockConfig, BlockSpec, ContentKind, NodeRenderFn, NodeTypeSpec, ParseRule, PropSchema,
    PropSpec, PropValue, Props, RenderContext, RenderStrategy, StyleConfig, StyleSpec,
};
use crate::spec::{apply_dom_attributes, create_style_spec, inline_content, wrap_in_block_structure};

pub fn default_block_specs() -> Vec<BlockSpec> {
    vec![
        built_in_block(
            BlockConfig::new("paragraph", ContentKind::Inline).with_props(PropSchema::default_props()),
            vec![ParseRule::tag("p")],
            |_| "p".to_string(),
        ),
        built_in_block(
            BlockConfig::new("heading", ContentKind::Inline).with_props(
                PropSchema::default_props().with("level", PropSpec::with_values(1i64, [1i64, 2, 3])),
            ),
            (1..=3i64)
                .map(|level| ParseRule::tag(format!("h{level}")).with_prop("level", level))
                .collect(),
            |props| format!("h{}", props.get("level").and_then(PropValue::as_number).unwrap_or(1)),
        ),
        built_in_block(
            BlockConfig::new("bulletListItem", ContentKind::Inline)
                .with_props(PropSchema::default_props()),
            vec![ParseRule::tag("li").within("ul")],
            |_| "p".to_string(),
        ),
        built_in_block(
            BlockConfig::new("numberedListItem", ContentKind::Inline)
                .with_props(PropSchema::default_props()),
            vec![ParseRule::tag("li").within("ol")],
            |_| "p".to_string(),
        ),
        table_block(),
    ]
}

/// A block rendered as `div.bn-block-content > <tag>.bn-inline-content`.
fn built_in_block(
    config: BlockConfig,
    parse_rules: Vec<ParseRule>,
    tag: fn(&Props) -> String,
) -> BlockSpec {
    let prop_schema = config.prop_schema.clone();
    let block_type = config.block_type.clone();
    let render: NodeRenderFn = Rc::new(move |node: &Node, ctx: &RenderContext<'_>| {
        let props = props_from_attributes(&block_type, &prop_schema, node.attrs());
        let wrapper = wrap_in_block_structure(
            inline_content(&tag(&props), ctx.dom_attributes),
            &block_type,
            &props,
            &prop_schema,
            ctx.registry.inherited_props(),
            &ctx.dom_attributes.block_content,
        );
        RenderSpec::with_hole(wrapper, vec![0])
    });

    let mut node = NodeTypeSpec::for_block(&config, RenderStrategy::BuiltIn(render));
    node.parse_rules.extend(parse_rules);
    BlockSpec { config, node }
}

fn table_block() -> BlockSpec {
    let config = BlockConfig::new("table", ContentKind::Table).with_props(
        PropSchema::new()
            .with("backgroundColor", PropSpec::new("default"))
            .with("textColor", PropSpec::new("default")),
    );
    let prop_schema = config.prop_schema.clone();
    let render: NodeRenderFn = Rc::new(move |node: &Node, ctx: &RenderContext<'_>| {
        let props = props_from_attributes("table", &prop_schema, node.attrs());
        let table = Element::new("table").with_child(Element::new("tbody"));
        let wrapper = wrap_in_block_structure(
            table,
            "table",
            &props,
            &prop_schema,
            ctx.registry.inherited_props(),
            &ctx.dom_attributes.block_content,
        );
        RenderSpec::with_hole(wrapper, vec![0, 0])
    });

    let mut node = NodeTypeSpec::for_block(&config, RenderStrategy::BuiltIn(render));
    node.parse_rules.push(ParseRule::tag("table"));
    BlockSpec { config, node }
}

pub fn default_style_specs() -> Vec<StyleSpec> {
    let tagged = |style_type: &str, tag: &'static str| {
        create_style_spec(StyleConfig::boolean(style_type), move |_| {
            RenderSpec::wrapper(Element::new(tag))
        })
    };
    let colored = |style_type: &str, attr: &'static str| {
        create_style_spec(StyleConfig::string(style_type), move |value| {
            RenderSpec::wrapper(Element::new("span").with_attr(attr, value.unwrap_or_default()))
        })
    };

    vec![
        tagged("bold", "strong")
            .with_parse_rule(ParseRule::tag("strong"))
            .with_parse_rule(ParseRule::tag("b")),
        tagged("italic", "em")
            .with_parse_rule(ParseRule::tag("em"))
            .with_parse_rule(ParseRule::tag("i")),
        tagged("underline", "u").with_parse_rule(ParseRule::tag("u")),
        tagged("strike", "s")
            .with_parse_rule(ParseRule::tag("s"))
            .with_parse_rule(ParseRule::tag("del"))
            .with_parse_rule(ParseRule::tag("strike")),
        tagged("code", "code").with_parse_rule(ParseRule::tag("code")),
        colored("textColor", "data-text-color"),
        colored("backgroundColor", "data-background-color"),
    ]
}

/// `blockGroup`, `blockContainer`, `tableRow` and `tableCell`.
pub fn structural_node_specs() -> Vec<NodeTypeSpec> {
    vec![
        NodeTypeSpec {
            name: BLOCK_GROUP.to_string(),
            group: None,
            content: "blockContainer+",
            selectable: false,
            attributes: PropSchema::new(),
            parse_rules: vec![ParseRule::NodeType(BLOCK_GROUP.to_string())],
            render: RenderStrategy::BuiltIn(Rc::new(render_block_group)),
        },
        NodeTypeSpec {
            name: BLOCK_CONTAINER.to_string(),
            group: None,
            content: "blockContent blockGroup?",
            selectable: false,
            attributes: PropSchema::new().with("id", PropSpec::new("")),
            parse_rules: vec![ParseRule::NodeType("blockOuter".to_string())],
            render: RenderStrategy::BuiltIn(Rc::new(render_block_container)),
        },
        NodeTypeSpec {
            name: TABLE_ROW.to_string(),
            group: None,
            content: "tableCell+",
            selectable: false,
            attributes: PropSchema::new(),
            parse_rules: vec![ParseRule::tag("tr")],
            render: RenderStrategy::BuiltIn(Rc::new(|_: &Node, _: &RenderContext<'_>| {
                RenderSpec::wrapper(Element::new("tr"))
            })),
        },
        NodeTypeSpec {
            name: TABLE_CELL.to_string(),
            group: None,
            content: "inline*",
            selectable: false,
            attributes: PropSchema::new(),
            parse_rules: vec![ParseRule::tag("td"), ParseRule::tag("th")],
            render: RenderStrategy::BuiltIn(Rc::new(|_: &Node, _: &RenderContext<'_>| {
                RenderSpec::wrapper(Element::new("td"))
            })),
        },
    ]
}

fn render_block_group(_node: &Node, ctx: &RenderContext<'_>) -> RenderSpec {
    let mut group = Element::new("div");
    apply_dom_attributes(&mut group, "bn-block-group", &ctx.dom_attributes.block_group);
    group.set_attr("data-node-type", BLOCK_GROUP);
    RenderSpec::wrapper(group)
}

/// `div.bn-block-outer > div.bn-block`, the inner div being the hole. Both
/// carry the id and the block's non-default inherited props.
fn render_block_container(node: &Node, ctx: &RenderContext<'_>) -> RenderSpec {
    let mut html_attrs = Vec::new();
    if let Some(id) = node.attr("id") {
        html_attrs.push(("data-id".to_string(), id.to_string()));
    }
    if let Some(content) = node.first_child()
        && let Some(spec) = ctx.registry.block_spec(content.type_name())
    {
        let props = props_from_attributes(spec.block_type(), &spec.config.prop_schema, node.attrs());
        html_attrs.extend(inherited_external_attributes(
            &spec.config.prop_schema,
            &props,
            ctx.registry.inherited_props(),
        ));
    }

    let mut outer = Element::new("div");
    outer.set_attr("class", "bn-block-outer");
    outer.set_attr("data-node-type", "blockOuter");
    let mut inner = Element::new("div");
    apply_dom_attributes(&mut inner, "bn-block", &ctx.dom_attributes.block_container);
    inner.set_attr("data-node-type", BLOCK_CONTAINER);
    for (name, value) in html_attrs {
        outer.set_attr(name.as_str(), value.as_str());
        inner.set_attr(name, value);
    }
    outer.append(inner);
    RenderSpec::with_hole(outer, vec![0])
}
