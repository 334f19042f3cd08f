use thiserror::Error;

/// Errors raised while declaring or encoding against a schema.
///
/// These indicate a mistake in the calling code (an undeclared prop, a
/// malformed property schema) and are surfaced eagerly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("prop `{prop}` is not declared in the schema of `{owner}`")]
    SchemaMismatch { owner: String, prop: String },

    #[error("prop `{prop}` of `{owner}` does not accept {value}")]
    InvalidPropValue {
        owner: String,
        prop: String,
        value: String,
    },

    #[error("invalid prop schema for `{owner}.{prop}`: {reason}")]
    InvalidPropSchema {
        owner: String,
        prop: String,
        reason: String,
    },

    #[error("type `{0}` is registered more than once")]
    DuplicateType(String),

    #[error("type name `{0}` is reserved for structural nodes")]
    ReservedType(String),

    #[error("a schema needs at least one block type")]
    EmptySchema,
}

/// Errors raised by block conversion, serialization and document edits.
#[derive(Debug, Error)]
pub enum BlockError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("unknown block type `{0}`")]
    UnknownBlockType(String),

    #[error("unknown style `{0}`")]
    UnknownStyle(String),

    #[error("content hole not allowed in leaf node `{0}`")]
    InvalidLeafContent(String),

    #[error("block `{block_type}` expects {expected} content")]
    ContentMismatch {
        block_type: String,
        expected: &'static str,
    },

    #[error("block with id `{0}` not found")]
    BlockNotFound(String),

    #[error("block id `{0}` is already in the document")]
    DuplicateId(String),

    #[error("malformed node tree: {0}")]
    MalformedNode(String),

    #[error("invalid block JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("markdown rendering failed: {0}")]
    Markdown(String),
}

pub type Result<T, E = BlockError> = std::result::Result<T, E>;
