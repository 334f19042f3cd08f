//! # Block JSON model
//!
//! The externally visible document units: [`Block`] (fully materialized,
//! produced by reading the node tree) and [`PartialBlock`] (caller-supplied
//! overrides for inserts and updates), with their inline and table content.

pub mod block;
pub mod inline;

pub use block::{
    Block, BlockContent, PartialBlock, PartialContent, TableContent, TableContentType, TableRow,
};
pub use inline::{
    InlineContent, Link, PartialInlineContent, StyleValue, StyledText, Styles, inline_text,
};
