//! # Property codec
//!
//! Moves prop values between three places: the [`Props`] map of a block, the
//! attributes stored on structural nodes, and the `data-*` attributes of
//! rendered HTML.
//!
//! Encoding is strict and fails on anything the schema does not declare.
//! Decoding is total: attributes that are missing or malformed fall back to
//! the schema default, because imported HTML is routinely imperfect.

use std::sync::OnceLock;

use regex::Regex;

use crate::dom::Element;
use crate::error::SchemaError;
use crate::node::Attrs;
use crate::schema::{PropSchema, PropValue, Props};

/// Source of raw attribute values, keyed by prop name.
pub trait AttributeReader {
    fn read(&self, name: &str) -> Option<PropValue>;
}

impl AttributeReader for Attrs {
    fn read(&self, name: &str) -> Option<PropValue> {
        self.get(name).cloned()
    }
}

impl<T: AttributeReader + ?Sized> AttributeReader for &T {
    fn read(&self, name: &str) -> Option<PropValue> {
        (**self).read(name)
    }
}

/// Reads from `primary`, falling back to `fallback` for absent attributes.
///
/// Content nodes layer over their container, which holds inherited props.
pub struct Layered<A, B> {
    pub primary: A,
    pub fallback: B,
}

impl<A: AttributeReader, B: AttributeReader> AttributeReader for Layered<A, B> {
    fn read(&self, name: &str) -> Option<PropValue> {
        self.primary.read(name).or_else(|| self.fallback.read(name))
    }
}

/// The `data-*` attributes of a DOM element, looked up by camelCase prop name.
pub struct DataAttributes<'a>(pub &'a Element);

impl AttributeReader for DataAttributes<'_> {
    fn read(&self, name: &str) -> Option<PropValue> {
        self.0
            .attr(&camel_to_data_kebab(name))
            .map(|value| PropValue::Str(value.to_string()))
    }
}

/// Encodes `props` for storage on a node.
///
/// Only supplied props are emitted; reading falls back to defaults for the
/// rest.
pub fn attributes_from_props(
    owner: &str,
    schema: &PropSchema,
    props: &Props,
) -> Result<Attrs, SchemaError> {
    let mut attrs = Attrs::new();
    for (name, value) in props {
        let Some(spec) = schema.get(name) else {
            return Err(SchemaError::SchemaMismatch {
                owner: owner.to_string(),
                prop: name.clone(),
            });
        };
        if !spec.accepts(value) {
            return Err(SchemaError::InvalidPropValue {
                owner: owner.to_string(),
                prop: name.clone(),
                value: format!("{value:?}"),
            });
        }
        attrs.insert(name.clone(), value.clone());
    }
    Ok(attrs)
}

/// Decodes every prop of `schema` from `reader`. Never fails.
pub fn props_from_attributes(owner: &str, schema: &PropSchema, reader: &impl AttributeReader) -> Props {
    schema
        .iter()
        .map(|(name, spec)| {
            let value = match reader.read(name) {
                None => spec.default.clone(),
                Some(raw) => spec.coerce(&raw).unwrap_or_else(|| {
                    log::warn!(
                        "`{owner}.{name}`: ignoring malformed value {raw:?}, using default `{}`",
                        spec.default
                    );
                    spec.default.clone()
                }),
            };
            (name.to_string(), value)
        })
        .collect()
}

/// `data-*` attributes for a block content element.
///
/// Props equal to their default are skipped, as are `inherited` props, which
/// the enclosing container renders.
pub fn to_external_attributes(
    schema: &PropSchema,
    props: &Props,
    inherited: &[String],
) -> Vec<(String, String)> {
    external_attributes(schema, props, |name| !inherited.iter().any(|p| p == name))
}

/// `data-*` attributes for a block container: only its non-default
/// inherited props.
pub fn inherited_external_attributes(
    schema: &PropSchema,
    props: &Props,
    inherited: &[String],
) -> Vec<(String, String)> {
    external_attributes(schema, props, |name| inherited.iter().any(|p| p == name))
}

fn external_attributes(
    schema: &PropSchema,
    props: &Props,
    include: impl Fn(&str) -> bool,
) -> Vec<(String, String)> {
    schema
        .iter()
        .filter(|(name, _)| include(name))
        .filter_map(|(name, spec)| {
            let value = props.get(name)?;
            (*value != spec.default).then(|| (camel_to_data_kebab(name), value.to_string()))
        })
        .collect()
}

/// `textAlignment` -> `data-text-alignment`.
pub fn camel_to_data_kebab(name: &str) -> String {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    let boundary =
        BOUNDARY.get_or_init(|| Regex::new(r"([a-z])([A-Z])").expect("Invalid case boundary regex"));
    format!("data-{}", boundary.replace_all(name, "${1}-${2}").to_lowercase())
}
