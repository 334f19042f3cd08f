//! # Spec builders
//!
//! The public way to extend a schema: [`create_block_spec`] turns a render
//! function over a [`Block`] into a full block spec, [`create_style_spec`]
//! does the same for an inline style. Both tag their output so the HTML they
//! produce can be imported again.

pub mod defaults;

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::codec::to_external_attributes;
use crate::dom::{Element, RenderSpec, merge_css_classes};
use crate::editor::Editor;
use crate::model::Block;
use crate::schema::{
    BlockConfig, BlockHtmlFn, BlockSpec, CustomRender, NodeTypeSpec, PropSchema, Props,
    RenderStrategy, StyleConfig, StylePropSchema, StyleSpec,
};

/// Class marking the element that receives a block's inline content.
pub const INLINE_CONTENT_CLASS: &str = "bn-inline-content";

/// Class of the element wrapping every block's content.
pub const BLOCK_CONTENT_CLASS: &str = "bn-block-content";

/// Extra HTML attributes added to the elements the editor renders.
///
/// A `class` entry is merged with the built-in classes; every other entry is
/// set as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomAttributes {
    pub block_container: BTreeMap<String, String>,
    pub block_group: BTreeMap<String, String>,
    pub block_content: BTreeMap<String, String>,
    pub inline_content: BTreeMap<String, String>,
}

/// Sets `extra` on `el`, merging its `class` after `base_class`.
pub fn apply_dom_attributes(el: &mut Element, base_class: &str, extra: &BTreeMap<String, String>) {
    for (name, value) in extra.iter().filter(|(name, _)| *name != "class") {
        el.set_attr(name.as_str(), value.as_str());
    }
    let extra_class = extra.get("class").map(String::as_str).unwrap_or("");
    el.set_attr("class", merge_css_classes(&[base_class, extra_class]));
}

/// The placeholder element a block render marks as its content hole.
pub fn inline_content(tag: &str, dom_attributes: &DomAttributes) -> Element {
    let mut el = Element::new(tag);
    apply_dom_attributes(&mut el, INLINE_CONTENT_CLASS, &dom_attributes.inline_content);
    el
}

/// Wraps a block's rendered element in the `bn-block-content` element that
/// identifies its type and non-default, non-inherited props.
pub fn wrap_in_block_structure(
    element: Element,
    block_type: &str,
    props: &Props,
    prop_schema: &PropSchema,
    inherited: &[String],
    dom_attributes: &BTreeMap<String, String>,
) -> Element {
    let mut wrapper = Element::new("div");
    apply_dom_attributes(&mut wrapper, BLOCK_CONTENT_CLASS, dom_attributes);
    wrapper.set_attr("data-content-type", block_type);
    for (name, value) in to_external_attributes(prop_schema, props, inherited) {
        wrapper.set_attr(name, value);
    }
    wrapper.append(element);
    wrapper
}

pub type BlockRenderFn = Rc<dyn Fn(&Block, &Editor) -> Element>;

/// Render functions of a custom block.
///
/// `render` is used in the editor and for internal HTML; `to_external_html`
/// replaces it for exports when given. Both see the block and a shared
/// borrow of the editor, so they cannot change the document.
#[derive(Clone)]
pub struct CustomBlockImplementation {
    pub render: BlockRenderFn,
    pub to_external_html: Option<BlockRenderFn>,
}

impl CustomBlockImplementation {
    pub fn new(render: impl Fn(&Block, &Editor) -> Element + 'static) -> Self {
        Self {
            render: Rc::new(render),
            to_external_html: None,
        }
    }

    pub fn with_external_html(
        mut self,
        render: impl Fn(&Block, &Editor) -> Element + 'static,
    ) -> Self {
        self.to_external_html = Some(Rc::new(render));
        self
    }
}

/// Builds a block spec rendered by `implementation`.
///
/// The node type declares the config's props as attributes and is parsed
/// from `data-content-type`. Its serializers render off-tree, wrap the result
/// with [`wrap_in_block_structure`] and report the first
/// `.bn-inline-content` element as the content hole.
pub fn create_block_spec(config: BlockConfig, implementation: CustomBlockImplementation) -> BlockSpec {
    let external = implementation
        .to_external_html
        .clone()
        .unwrap_or_else(|| implementation.render.clone());
    let render = RenderStrategy::Custom(CustomRender {
        to_internal_html: render_off_tree(&config, implementation.render),
        to_external_html: render_off_tree(&config, external),
    });
    BlockSpec {
        node: NodeTypeSpec::for_block(&config, render),
        config,
    }
}

fn render_off_tree(config: &BlockConfig, render: BlockRenderFn) -> BlockHtmlFn {
    let block_type = config.block_type.clone();
    let prop_schema = config.prop_schema.clone();
    Rc::new(move |block, editor| {
        let dom = wrap_in_block_structure(
            render(block, editor),
            &block_type,
            &block.props,
            &prop_schema,
            editor.schema().inherited_props(),
            &editor.dom_attributes().block_content,
        );
        let content_hole = dom.find_path(&|el| el.has_class(INLINE_CONTENT_CLASS));
        Ok(RenderSpec { dom, content_hole })
    })
}

/// Builds a style spec rendered by `render`, which gets the style's value
/// for string styles and `None` for boolean ones.
///
/// The rendered element is tagged with `data-style-type`, plus `data-value`
/// for string styles.
pub fn create_style_spec(
    config: StyleConfig,
    render: impl Fn(Option<&str>) -> RenderSpec + 'static,
) -> StyleSpec {
    let style_type = config.style_type.clone();
    let string_valued = config.prop_schema == StylePropSchema::String;
    StyleSpec {
        config,
        render: Rc::new(move |value| {
            let mut spec = render(value);
            spec.dom.set_attr("data-style-type", style_type.as_str());
            if string_valued && let Some(value) = value {
                spec.dom.set_attr("data-value", value);
            }
            spec
        }),
        parse_rules: Vec::new(),
    }
}
