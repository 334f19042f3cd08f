use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Concrete prop values keyed by prop name.
pub type Props = BTreeMap<String, PropValue>;

/// A single property value.
///
/// Enumerated strings and numbers are plain `Str`/`Number` values whose
/// [`PropSpec`] restricts them to a fixed set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Bool(bool),
    Number(i64),
    Str(String),
}

/// The kind of a [`PropValue`], used to validate schemas and coerce attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Boolean,
    Number,
    String,
}

impl PropValue {
    pub fn kind(&self) -> PropKind {
        match self {
            PropValue::Bool(_) => PropKind::Boolean,
            PropValue::Number(_) => PropKind::Number,
            PropValue::Str(_) => PropKind::String,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            PropValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Bool(b) => write!(f, "{b}"),
            PropValue::Number(n) => write!(f, "{n}"),
            PropValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Number(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

/// Declaration of one property: its default and, optionally, the closed set
/// of values it may take.
#[derive(Debug, Clone, PartialEq)]
pub struct PropSpec {
    pub default: PropValue,
    pub values: Option<Vec<PropValue>>,
}

impl PropSpec {
    pub fn new(default: impl Into<PropValue>) -> Self {
        Self {
            default: default.into(),
            values: None,
        }
    }

    pub fn with_values<V: Into<PropValue>>(
        default: impl Into<PropValue>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            default: default.into(),
            values: Some(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn kind(&self) -> PropKind {
        self.default.kind()
    }

    /// Whether `value` has the declared kind and is one of the allowed values.
    pub fn accepts(&self, value: &PropValue) -> bool {
        if value.kind() != self.kind() {
            return false;
        }
        match &self.values {
            Some(values) => values.contains(value),
            None => true,
        }
    }

    /// Best-effort conversion of a raw attribute into a value this spec accepts.
    ///
    /// Attributes read from HTML arrive as strings, so `"true"` becomes a
    /// boolean and `"2"` a number when the spec asks for one. Returns `None`
    /// for anything that cannot be made acceptable.
    pub fn coerce(&self, raw: &PropValue) -> Option<PropValue> {
        let candidate = match (self.kind(), raw) {
            (kind, value) if kind == value.kind() => value.clone(),
            (PropKind::Boolean, PropValue::Str(s)) => match s.as_str() {
                "true" => PropValue::Bool(true),
                "false" => PropValue::Bool(false),
                _ => return None,
            },
            (PropKind::Number, PropValue::Str(s)) => PropValue::Number(s.trim().parse().ok()?),
            (PropKind::String, other) => PropValue::Str(other.to_string()),
            _ => return None,
        };
        self.accepts(&candidate).then_some(candidate)
    }

    fn validate(&self, owner: &str, prop: &str) -> Result<(), SchemaError> {
        let invalid = |reason: String| SchemaError::InvalidPropSchema {
            owner: owner.to_string(),
            prop: prop.to_string(),
            reason,
        };

        let Some(values) = &self.values else {
            return Ok(());
        };
        if values.is_empty() {
            return Err(invalid("empty value set".to_string()));
        }
        if let Some(bad) = values.iter().find(|v| v.kind() != self.kind()) {
            return Err(invalid(format!(
                "value `{bad}` is not a {:?} like the default",
                self.kind()
            )));
        }
        if !values.contains(&self.default) {
            return Err(invalid(format!(
                "default `{}` is not one of the allowed values",
                self.default
            )));
        }
        Ok(())
    }
}

/// Ordered mapping from prop name to its declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropSchema {
    props: BTreeMap<String, PropSpec>,
}

impl PropSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, spec: PropSpec) -> Self {
        self.insert(name, spec);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: PropSpec) {
        self.props.insert(name.into(), spec);
    }

    /// Adds every prop of `other`, keeping existing declarations on conflict.
    pub fn extend(mut self, other: &PropSchema) -> Self {
        for (name, spec) in other.iter() {
            self.props
                .entry(name.to_string())
                .or_insert_with(|| spec.clone());
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropSpec> {
        self.props.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropSpec)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.props.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Every prop set to its default.
    pub fn defaults(&self) -> Props {
        self.props
            .iter()
            .map(|(name, spec)| (name.clone(), spec.default.clone()))
            .collect()
    }

    pub fn validate(&self, owner: &str) -> Result<(), SchemaError> {
        for (name, spec) in &self.props {
            spec.validate(owner, name)?;
        }
        Ok(())
    }

    /// Props shared by the default block types.
    pub fn default_props() -> Self {
        PropSchema::new()
            .with("backgroundColor", PropSpec::new("default"))
            .with("textColor", PropSpec::new("default"))
            .with(
                "textAlignment",
                PropSpec::with_values("left", ["left", "center", "right", "justify"]),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn level() -> PropSpec {
        PropSpec::with_values(1i64, [1i64, 2, 3])
    }

    #[rstest]
    #[case(PropSpec::new(false), PropValue::from("true"), Some(PropValue::Bool(true)))]
    #[case(PropSpec::new(false), PropValue::from("yes"), None)]
    #[case(level(), PropValue::from("2"), Some(PropValue::Number(2)))]
    #[case(level(), PropValue::from("7"), None)]
    #[case(level(), PropValue::from("two"), None)]
    #[case(PropSpec::new("left"), PropValue::Number(4), Some(PropValue::from("4")))]
    #[case(
        PropSpec::with_values("left", ["left", "right"]),
        PropValue::from("center"),
        None
    )]
    fn test_coerce(
        #[case] spec: PropSpec,
        #[case] raw: PropValue,
        #[case] expected: Option<PropValue>,
    ) {
        assert_eq!(spec.coerce(&raw), expected);
    }

    #[test]
    fn test_defaults_cover_every_prop() {
        let schema = PropSchema::default_props().with("level", level());
        let defaults = schema.defaults();

        assert_eq!(defaults.len(), 4);
        assert_eq!(defaults["level"], PropValue::Number(1));
        assert_eq!(defaults["textAlignment"], PropValue::from("left"));
    }

    #[test]
    fn test_default_outside_values_is_rejected() {
        let schema = PropSchema::new().with("size", PropSpec::with_values("huge", ["s", "m"]));
        let err = schema.validate("card").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPropSchema { ref prop, .. } if prop == "size"));
    }

    #[test]
    fn test_mixed_value_kinds_are_rejected() {
        let spec = PropSpec {
            default: PropValue::Number(1),
            values: Some(vec![PropValue::Number(1), PropValue::from("2")]),
        };
        let schema = PropSchema::new().with("level", spec);
        assert!(schema.validate("heading").is_err());
    }

    #[test]
    fn test_json_shape_is_untagged() {
        let props: Props = [
            ("level".to_string(), PropValue::Number(2)),
            ("open".to_string(), PropValue::Bool(true)),
            ("textColor".to_string(), PropValue::from("red")),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&props).unwrap();
        assert_eq!(json, r#"{"level":2,"open":true,"textColor":"red"}"#);
        let back: Props = serde_json::from_str(&json).unwrap();
        assert_eq!(back, props);
    }
}
