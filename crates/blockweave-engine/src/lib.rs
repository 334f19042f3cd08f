pub mod clipboard;
pub mod codec;
pub mod convert;
pub mod dom;
pub mod editor;
pub mod error;
pub mod html_import;
pub mod markdown;
pub mod model;
pub mod node;
pub mod schema;
pub mod serializer;
pub mod spec;

// Re-export key types for easier usage
pub use clipboard::{Clipboard, ClipboardError, ClipboardPayload, MemoryClipboard};
pub use editor::{Editor, EditorOptions, Placement, Selection};
pub use error::{BlockError, Result, SchemaError};
pub use model::*;
pub use schema::{
    BlockConfig, ContentKind, PropSchema, PropValue, Props, SchemaBuilder, SchemaRegistry,
    StyleConfig, StylePropSchema,
};
pub use spec::{CustomBlockImplementation, DomAttributes, create_block_spec, create_style_spec};
