//! # Schema registry
//!
//! Block and style declarations, their property schemas, and the registry an
//! editor builds once from them.

pub mod props;
pub mod registry;

pub use props::{PropKind, PropSchema, PropSpec, PropValue, Props};
pub use registry::{
    BlockConfig, BlockHtmlFn, BlockSpec, ContentKind, CustomRender, DEFAULT_INHERITED_PROPS,
    NodeRenderFn, NodeTypeSpec, ParseRule, RenderContext, RenderStrategy, SchemaBuilder,
    SchemaRegistry, StyleConfig, StylePropSchema, StyleRenderFn, StyleSpec,
};
