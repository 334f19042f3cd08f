//! # Clipboard bridge
//!
//! Copy writes one payload with three parts keyed by media type: Block JSON
//! under the editor's private type, internal HTML under `text/html` and a
//! Markdown rendering under `text/plain`. Paste reads the richest part it
//! finds, in that order, and inserts the blocks after the text cursor with
//! fresh ids.
//!
//! Platform clipboards sit behind the [`Clipboard`] trait. Each copy or paste
//! serializes everything first and then performs a single write or read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::editor::{Editor, Placement};
use crate::error::BlockError;
use crate::html_import::html_to_blocks;
use crate::markdown::markdown_to_blocks;
use crate::model::{Block, PartialBlock};

pub const HTML_MIME: &str = "text/html";
pub const PLAIN_MIME: &str = "text/plain";

/// Private media type for Block JSON unless the editor is configured otherwise.
pub const DEFAULT_BLOCKS_MIME: &str = "web blockweave/blocks";

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard access was denied")]
    PermissionDenied,

    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard holds nothing that can be pasted")]
    Empty,

    #[error(transparent)]
    Bridge(#[from] BlockError),

    #[error("invalid block JSON on the clipboard: {0}")]
    Json(#[from] serde_json::Error),
}

/// Clipboard contents as media type -> text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardPayload {
    parts: BTreeMap<String, String>,
}

impl ClipboardPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_part(mut self, mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        self.insert(mime_type, data);
        self
    }

    pub fn insert(&mut self, mime_type: impl Into<String>, data: impl Into<String>) {
        self.parts.insert(mime_type.into(), data.into());
    }

    pub fn get(&self, mime_type: &str) -> Option<&str> {
        self.parts.get(mime_type).map(String::as_str)
    }

    pub fn mime_types(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// A system clipboard, or anything standing in for one.
pub trait Clipboard {
    fn read(&mut self) -> Result<ClipboardPayload, ClipboardError>;
    fn write(&mut self, payload: ClipboardPayload) -> Result<(), ClipboardError>;
}

/// Process-local clipboard.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Option<ClipboardPayload>,
    denied: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard that refuses every read and write.
    pub fn denied() -> Self {
        Self {
            contents: None,
            denied: true,
        }
    }

    pub fn with_contents(payload: ClipboardPayload) -> Self {
        Self {
            contents: Some(payload),
            denied: false,
        }
    }

    pub fn contents(&self) -> Option<&ClipboardPayload> {
        self.contents.as_ref()
    }
}

impl Clipboard for MemoryClipboard {
    fn read(&mut self) -> Result<ClipboardPayload, ClipboardError> {
        if self.denied {
            return Err(ClipboardError::PermissionDenied);
        }
        self.contents.clone().ok_or(ClipboardError::Empty)
    }

    fn write(&mut self, payload: ClipboardPayload) -> Result<(), ClipboardError> {
        if self.denied {
            return Err(ClipboardError::PermissionDenied);
        }
        self.contents = Some(payload);
        Ok(())
    }
}

impl Editor {
    /// The three-part payload for `blocks`.
    pub fn clipboard_payload(&self, blocks: &[Block]) -> Result<ClipboardPayload, ClipboardError> {
        let json = serde_json::to_string(blocks)?;
        let html = self.blocks_to_internal_html(blocks)?;
        let markdown = self.blocks_to_markdown(blocks)?;
        Ok(ClipboardPayload::new()
            .with_part(self.clipboard_mime_type(), json)
            .with_part(HTML_MIME, html)
            .with_part(PLAIN_MIME, markdown))
    }

    /// Copies the selected blocks.
    ///
    /// Returns `false` without touching the clipboard when fewer than two
    /// blocks are selected; plain text copy handles that case.
    pub fn copy(&self, clipboard: &mut dyn Clipboard) -> Result<bool, ClipboardError> {
        let Some(selection) = self.selection()? else {
            return Ok(false);
        };
        if selection.blocks.len() < 2 {
            return Ok(false);
        }
        let payload = self.clipboard_payload(&selection.blocks)?;
        clipboard.write(payload)?;
        log::debug!("copied {} blocks to the clipboard", selection.blocks.len());
        Ok(true)
    }

    /// Pastes after the text cursor block and returns the inserted blocks.
    pub fn paste(&mut self, clipboard: &mut dyn Clipboard) -> Result<Vec<Block>, ClipboardError> {
        let payload = clipboard.read()?;
        let blocks = self.blocks_from_payload(&payload)?;
        if blocks.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self.text_cursor_block()?.id;
        let inserted = self.insert_blocks(&blocks, &cursor, Placement::After)?;
        log::debug!("pasted {} blocks after `{cursor}`", inserted.len());
        Ok(inserted)
    }

    /// Partial blocks for the best part of `payload`, without ids.
    pub fn blocks_from_payload(
        &self,
        payload: &ClipboardPayload,
    ) -> Result<Vec<PartialBlock>, ClipboardError> {
        let blocks = if let Some(json) = payload.get(self.clipboard_mime_type()) {
            serde_json::from_str::<Vec<PartialBlock>>(json)?
        } else if let Some(html) = payload.get(HTML_MIME) {
            log::warn!("no block JSON on the clipboard, importing HTML");
            html_to_blocks(html, self.schema())
        } else if let Some(text) = payload.get(PLAIN_MIME) {
            log::warn!("no block JSON or HTML on the clipboard, importing text as Markdown");
            markdown_to_blocks(text, self.schema())
        } else {
            return Err(ClipboardError::Empty);
        };
        Ok(blocks.into_iter().map(PartialBlock::without_ids).collect())
    }
}
