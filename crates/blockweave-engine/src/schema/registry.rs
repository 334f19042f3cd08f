use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::dom::RenderSpec;
use crate::editor::Editor;
use crate::error::{BlockError, Result, SchemaError};
use crate::model::Block;
use crate::node::{LINK_MARK, Node, RESERVED_NAMES};
use crate::schema::props::{PropSchema, Props};
use crate::spec::DomAttributes;

/// Props the container node carries on behalf of its content node.
pub const DEFAULT_INHERITED_PROPS: &[&str] = &["backgroundColor", "textColor"];

/// What a block type may hold between its delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Inline,
    None,
    Table,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Inline => "inline",
            ContentKind::None => "none",
            ContentKind::Table => "table",
        }
    }

    /// Content expression of the node type backing a block of this kind.
    fn node_content(self) -> &'static str {
        match self {
            ContentKind::Inline => "inline*",
            ContentKind::None => "",
            ContentKind::Table => "tableRow+",
        }
    }
}

/// User-facing declaration of a block type.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockConfig {
    pub block_type: String,
    pub prop_schema: PropSchema,
    pub content: ContentKind,
}

impl BlockConfig {
    pub fn new(block_type: impl Into<String>, content: ContentKind) -> Self {
        Self {
            block_type: block_type.into(),
            prop_schema: PropSchema::new(),
            content,
        }
    }

    pub fn with_props(mut self, prop_schema: PropSchema) -> Self {
        self.prop_schema = prop_schema;
        self
    }
}

/// A style either toggles on and off or carries one string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StylePropSchema {
    Boolean,
    String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleConfig {
    pub style_type: String,
    pub prop_schema: StylePropSchema,
}

impl StyleConfig {
    pub fn boolean(style_type: impl Into<String>) -> Self {
        Self {
            style_type: style_type.into(),
            prop_schema: StylePropSchema::Boolean,
        }
    }

    pub fn string(style_type: impl Into<String>) -> Self {
        Self {
            style_type: style_type.into(),
            prop_schema: StylePropSchema::String,
        }
    }
}

/// Everything a built-in node render may consult.
pub struct RenderContext<'a> {
    pub registry: &'a SchemaRegistry,
    pub dom_attributes: &'a DomAttributes,
}

pub type NodeRenderFn = Rc<dyn Fn(&Node, &RenderContext<'_>) -> RenderSpec>;
pub type BlockHtmlFn = Rc<dyn Fn(&Block, &Editor) -> Result<RenderSpec>>;
pub type StyleRenderFn = Rc<dyn Fn(Option<&str>) -> RenderSpec>;

/// Serializers of a block type that has no node-level render.
#[derive(Clone)]
pub struct CustomRender {
    pub to_internal_html: BlockHtmlFn,
    pub to_external_html: BlockHtmlFn,
}

/// How the serializer renders a node type. Fixed when the spec is built.
#[derive(Clone)]
pub enum RenderStrategy {
    BuiltIn(NodeRenderFn),
    Custom(CustomRender),
}

impl fmt::Debug for RenderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderStrategy::BuiltIn(_) => f.write_str("BuiltIn"),
            RenderStrategy::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// How an HTML element is recognized as a node or style when importing.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseRule {
    /// An element whose `data-content-type` names this type.
    ContentType(String),
    /// A structural element tagged with `data-node-type`.
    NodeType(String),
    /// A plain tag, optionally only directly inside `within`, with fixed props.
    Tag {
        tag: String,
        within: Option<String>,
        props: Props,
    },
}

impl ParseRule {
    pub fn tag(tag: impl Into<String>) -> Self {
        ParseRule::Tag {
            tag: tag.into(),
            within: None,
            props: Props::new(),
        }
    }

    pub fn within(self, parent: impl Into<String>) -> Self {
        match self {
            ParseRule::Tag { tag, props, .. } => ParseRule::Tag {
                tag,
                within: Some(parent.into()),
                props,
            },
            other => other,
        }
    }

    pub fn with_prop(self, name: &str, value: impl Into<crate::schema::PropValue>) -> Self {
        match self {
            ParseRule::Tag {
                tag,
                within,
                mut props,
            } => {
                props.insert(name.to_string(), value.into());
                ParseRule::Tag { tag, within, props }
            }
            other => other,
        }
    }
}

/// Node-level definition backing a block type or a structural node.
#[derive(Debug, Clone)]
pub struct NodeTypeSpec {
    pub name: String,
    pub group: Option<&'static str>,
    /// Content expression: `""` for leaves, `"inline*"`, `"tableRow+"` ...
    pub content: &'static str,
    pub selectable: bool,
    pub attributes: PropSchema,
    pub parse_rules: Vec<ParseRule>,
    pub render: RenderStrategy,
}

impl NodeTypeSpec {
    /// Node type for a block's content node, derived from its config.
    pub fn for_block(config: &BlockConfig, render: RenderStrategy) -> Self {
        Self {
            name: config.block_type.clone(),
            group: Some("blockContent"),
            content: config.content.node_content(),
            selectable: true,
            attributes: config.prop_schema.clone(),
            parse_rules: vec![ParseRule::ContentType(config.block_type.clone())],
            render,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.content.is_empty()
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.render, RenderStrategy::Custom(_))
    }
}

#[derive(Debug, Clone)]
pub struct BlockSpec {
    pub config: BlockConfig,
    pub node: NodeTypeSpec,
}

impl BlockSpec {
    pub fn block_type(&self) -> &str {
        &self.config.block_type
    }
}

#[derive(Clone)]
pub struct StyleSpec {
    pub config: StyleConfig,
    pub render: StyleRenderFn,
    pub parse_rules: Vec<ParseRule>,
}

impl StyleSpec {
    pub fn style_type(&self) -> &str {
        &self.config.style_type
    }

    pub fn with_parse_rule(mut self, rule: ParseRule) -> Self {
        self.parse_rules.push(rule);
        self
    }
}

impl fmt::Debug for StyleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleSpec")
            .field("config", &self.config)
            .field("parse_rules", &self.parse_rules)
            .finish_non_exhaustive()
    }
}

/// Collects block and style specs for one editor.
///
/// Starts from the default specs; a custom spec with a default's name
/// replaces it in place. Errors are reported by [`SchemaBuilder::build`].
#[derive(Debug)]
pub struct SchemaBuilder {
    blocks: Vec<BlockSpec>,
    styles: Vec<StyleSpec>,
    default_blocks: HashSet<String>,
    default_styles: HashSet<String>,
    inherited: Vec<String>,
    errors: Vec<SchemaError>,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    pub fn new() -> Self {
        let blocks = crate::spec::defaults::default_block_specs();
        let styles = crate::spec::defaults::default_style_specs();
        Self {
            default_blocks: blocks.iter().map(|b| b.block_type().to_string()).collect(),
            default_styles: styles.iter().map(|s| s.style_type().to_string()).collect(),
            blocks,
            styles,
            ..Self::empty()
        }
    }

    /// A builder without the default specs.
    pub fn empty() -> Self {
        Self {
            blocks: Vec::new(),
            styles: Vec::new(),
            default_blocks: HashSet::new(),
            default_styles: HashSet::new(),
            inherited: DEFAULT_INHERITED_PROPS.iter().map(|s| s.to_string()).collect(),
            errors: Vec::new(),
        }
    }

    pub fn block(mut self, spec: BlockSpec) -> Self {
        let name = spec.block_type().to_string();
        match self.blocks.iter().position(|b| b.block_type() == name) {
            Some(idx) if self.default_blocks.remove(&name) => self.blocks[idx] = spec,
            Some(_) => self.errors.push(SchemaError::DuplicateType(name)),
            None => self.blocks.push(spec),
        }
        self
    }

    pub fn style(mut self, spec: StyleSpec) -> Self {
        let name = spec.style_type().to_string();
        match self.styles.iter().position(|s| s.style_type() == name) {
            Some(idx) if self.default_styles.remove(&name) => self.styles[idx] = spec,
            Some(_) => self.errors.push(SchemaError::DuplicateType(name)),
            None => self.styles.push(spec),
        }
        self
    }

    /// Replaces the set of props carried on the container node.
    pub fn inherited_props<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inherited = props.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> Result<SchemaRegistry, SchemaError> {
        if let Some(err) = self.errors.first() {
            return Err(err.clone());
        }
        if self.blocks.is_empty() {
            return Err(SchemaError::EmptySchema);
        }

        let names = self
            .blocks
            .iter()
            .map(BlockSpec::block_type)
            .chain(self.styles.iter().map(StyleSpec::style_type));
        for name in names {
            if RESERVED_NAMES.contains(&name) {
                return Err(SchemaError::ReservedType(name.to_string()));
            }
        }
        for block in &self.blocks {
            block.config.prop_schema.validate(block.block_type())?;
        }

        let registry = self.assemble();
        log::debug!(
            "built schema with {} block types and {} styles",
            registry.blocks.len(),
            registry.styles.len()
        );
        Ok(registry)
    }

    fn assemble(self) -> SchemaRegistry {
        SchemaRegistry {
            blocks: self.blocks,
            styles: self.styles,
            structural: crate::spec::defaults::structural_node_specs(),
            inherited: self.inherited,
        }
    }
}

/// The immutable set of block and style types known to one editor.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    blocks: Vec<BlockSpec>,
    styles: Vec<StyleSpec>,
    structural: Vec<NodeTypeSpec>,
    inherited: Vec<String>,
}

impl Default for SchemaRegistry {
    /// The default specs alone. These are known to be valid.
    fn default() -> Self {
        SchemaBuilder::new().assemble()
    }
}

impl SchemaRegistry {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub fn block_spec(&self, block_type: &str) -> Option<&BlockSpec> {
        self.blocks.iter().find(|b| b.block_type() == block_type)
    }

    pub fn require_block(&self, block_type: &str) -> Result<&BlockSpec> {
        self.block_spec(block_type)
            .ok_or_else(|| BlockError::UnknownBlockType(block_type.to_string()))
    }

    pub fn style_spec(&self, style_type: &str) -> Option<&StyleSpec> {
        self.styles.iter().find(|s| s.style_type() == style_type)
    }

    pub fn require_style(&self, style_type: &str) -> Result<&StyleSpec> {
        self.style_spec(style_type)
            .ok_or_else(|| BlockError::UnknownStyle(style_type.to_string()))
    }

    /// Block specs in registration order.
    pub fn blocks(&self) -> impl Iterator<Item = &BlockSpec> {
        self.blocks.iter()
    }

    /// Style specs in registration order.
    pub fn styles(&self) -> impl Iterator<Item = &StyleSpec> {
        self.styles.iter()
    }

    /// Node type of a block's content node or of a structural node.
    pub fn node_type(&self, name: &str) -> Option<&NodeTypeSpec> {
        self.block_spec(name)
            .map(|b| &b.node)
            .or_else(|| self.structural.iter().find(|n| n.name == name))
    }

    /// Ordering of marks on a text node; links wrap every style.
    pub fn mark_rank(&self, mark_type: &str) -> Option<usize> {
        if mark_type == LINK_MARK {
            return Some(0);
        }
        self.styles
            .iter()
            .position(|s| s.style_type() == mark_type)
            .map(|idx| idx + 1)
    }

    pub fn inherited_props(&self) -> &[String] {
        &self.inherited
    }

    pub fn is_inherited(&self, prop: &str) -> bool {
        self.inherited.iter().any(|p| p == prop)
    }

    /// Type used for blank blocks, the first one registered.
    pub fn default_block_type(&self) -> &str {
        self.blocks
            .first()
            .map(BlockSpec::block_type)
            .unwrap_or("paragraph")
    }
}
