//! Property values for resource declarations.
//!
//! An [`Input`] is either a literal, a reference to another resource's
//! output, a string template mixing both, or a nested list/map of inputs.
//! References are what give the dependency graph its reference edges.

use std::collections::BTreeMap;

use serde_json::Value;
use stackwright_common::error::{Result, StackwrightError};
use stackwright_common::types::Urn;

use crate::deferred::Deferred;

/// A reference to one output property of a declared resource.
#[derive(Debug, Clone)]
pub struct OutputRef {
    /// Resource that produces the value.
    pub producer: Urn,
    /// Output property name.
    pub property: String,
    cell: Deferred,
}

impl OutputRef {
    /// Creates a reference backed by `cell`.
    #[must_use]
    pub fn new(producer: Urn, property: impl Into<String>, cell: Deferred) -> Self {
        Self {
            producer,
            property: property.into(),
            cell,
        }
    }

    /// The underlying deferred cell.
    #[must_use]
    pub const fn cell(&self) -> &Deferred {
        &self.cell
    }

    /// Resolves the referenced output.
    ///
    /// # Errors
    ///
    /// Returns [`StackwrightError::AlreadyResolved`] on a second write.
    pub fn resolve(&self, value: Value) -> Result<()> {
        self.cell
            .resolve(value)
            .map_err(|_| StackwrightError::AlreadyResolved {
                urn: self.producer.to_string(),
                property: self.property.clone(),
            })
    }

    /// Placeholder rendered while the value is still pending.
    #[must_use]
    pub fn placeholder(&self) -> String {
        format!("${{{}.{}}}", self.producer.name(), self.property)
    }

    /// Returns `true` if both references read the same cell.
    #[must_use]
    pub fn same_output(&self, other: &Self) -> bool {
        self.cell.same_cell(&other.cell)
    }
}

/// One piece of a string template.
#[derive(Debug, Clone)]
pub enum TemplatePart {
    /// Literal text.
    Text(String),
    /// Text produced by another resource.
    Output(OutputRef),
}

/// A property value in a resource declaration.
#[derive(Debug, Clone)]
pub enum Input {
    /// A value known at declaration time.
    Value(Value),
    /// A value produced by another resource.
    Output(OutputRef),
    /// A string assembled from literals and outputs.
    Template(Vec<TemplatePart>),
    /// An ordered list of inputs.
    List(Vec<Input>),
    /// A keyed map of inputs.
    Map(BTreeMap<String, Input>),
}

impl Input {
    /// A literal string.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Value(Value::String(value.into()))
    }

    /// A list of literal strings.
    #[must_use]
    pub fn strings<S: AsRef<str>>(values: &[S]) -> Self {
        Self::List(values.iter().map(|v| Self::string(v.as_ref())).collect())
    }

    /// A map built from key/input pairs.
    #[must_use]
    pub fn object<'a>(entries: impl IntoIterator<Item = (&'a str, Self)>) -> Self {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    /// A string template.
    #[must_use]
    pub const fn template(parts: Vec<TemplatePart>) -> Self {
        Self::Template(parts)
    }

    /// Concatenates inputs into one string template.
    ///
    /// Literal strings become text, outputs stay deferred, nested templates
    /// are flattened, and any other literal is rendered as JSON text.
    #[must_use]
    pub fn concat(inputs: impl IntoIterator<Item = Self>) -> Self {
        let mut parts = Vec::new();
        for input in inputs {
            match input {
                Self::Value(Value::String(text)) => parts.push(TemplatePart::Text(text)),
                Self::Output(output) => parts.push(TemplatePart::Output(output)),
                Self::Template(nested) => parts.extend(nested),
                other => parts.push(TemplatePart::Text(other.to_json().to_string())),
            }
        }
        Self::Template(parts)
    }

    /// Collects every output reference reachable from this input.
    #[must_use]
    pub fn references(&self) -> Vec<&OutputRef> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references<'a>(&'a self, refs: &mut Vec<&'a OutputRef>) {
        match self {
            Self::Value(_) => {}
            Self::Output(output) => refs.push(output),
            Self::Template(parts) => {
                for part in parts {
                    if let TemplatePart::Output(output) = part {
                        refs.push(output);
                    }
                }
            }
            Self::List(items) => items.iter().for_each(|i| i.collect_references(refs)),
            Self::Map(entries) => entries.values().for_each(|i| i.collect_references(refs)),
        }
    }

    /// Returns `true` once every referenced output is resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.references().iter().all(|r| r.cell().is_resolved())
    }

    /// Renders this input as JSON, substituting a `${name.property}`
    /// placeholder for each output that is still pending.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Output(output) => output
                .cell()
                .get()
                .cloned()
                .unwrap_or_else(|| Value::String(output.placeholder())),
            Self::Template(parts) => {
                let mut rendered = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Text(text) => rendered.push_str(text),
                        TemplatePart::Output(output) => match output.cell().get() {
                            Some(Value::String(s)) => rendered.push_str(s),
                            Some(other) => rendered.push_str(&other.to_string()),
                            None => rendered.push_str(&output.placeholder()),
                        },
                    }
                }
                Value::String(rendered)
            }
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Returns the literal string, if this input is one.
    #[must_use]
    pub fn as_literal_str(&self) -> Option<&str> {
        match self {
            Self::Value(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns the output reference, if this input is one.
    #[must_use]
    pub const fn as_output(&self) -> Option<&OutputRef> {
        match self {
            Self::Output(output) => Some(output),
            _ => None,
        }
    }

    /// Looks up a key in a map input.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Map(entries) => entries.get(key),
            _ => None,
        }
    }
}

impl From<&str> for Input {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for Input {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

impl From<bool> for Input {
    fn from(value: bool) -> Self {
        Self::Value(Value::Bool(value))
    }
}

impl From<u16> for Input {
    fn from(value: u16) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<u32> for Input {
    fn from(value: u32) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<f64> for Input {
    fn from(value: f64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<OutputRef> for Input {
    fn from(value: OutputRef) -> Self {
        Self::Output(value)
    }
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}
