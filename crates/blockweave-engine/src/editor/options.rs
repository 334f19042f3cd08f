use crate::clipboard::DEFAULT_BLOCKS_MIME;
use crate::model::PartialBlock;
use crate::schema::SchemaBuilder;
use crate::spec::DomAttributes;

/// Everything an [`Editor`](super::Editor) is created from.
#[derive(Debug)]
pub struct EditorOptions {
    /// Block and style declarations. Defaults to the built-in specs.
    pub schema: SchemaBuilder,
    /// Blocks the document starts with. An empty list gives one empty
    /// block of the schema's first type.
    pub initial_content: Vec<PartialBlock>,
    /// Props stored on the block container instead of its content node.
    /// `None` keeps the schema builder's list.
    pub inherited_props: Option<Vec<String>>,
    pub dom_attributes: DomAttributes,
    /// Media type of the private clipboard part holding Block JSON.
    pub clipboard_mime_type: String,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            schema: SchemaBuilder::new(),
            initial_content: Vec::new(),
            inherited_props: None,
            dom_attributes: DomAttributes::default(),
            clipboard_mime_type: DEFAULT_BLOCKS_MIME.to_string(),
        }
    }
}

impl EditorOptions {
    pub fn with_schema(mut self, schema: SchemaBuilder) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_initial_content(mut self, blocks: Vec<PartialBlock>) -> Self {
        self.initial_content = blocks;
        self
    }

    pub fn with_inherited_props<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inherited_props = Some(props.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_dom_attributes(mut self, dom_attributes: DomAttributes) -> Self {
        self.dom_attributes = dom_attributes;
        self
    }

    pub fn with_clipboard_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.clipboard_mime_type = mime_type.into();
        self
    }
}
