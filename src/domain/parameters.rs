//! The open attribute bag describing one resolved run

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Where an attribute's value came from.
///
/// Variants are declared from highest to lowest precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Given explicitly on the command line.
    CommandLine,
    /// Bound by the primary parameter file.
    Primary,
    /// Read from one secondary record (JSON entry or INI section).
    Secondary,
    /// Fallback default of a registered command-line option.
    CommandLineDefault,
    /// Baseline default supplied by the parameter template.
    Baseline,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::CommandLine => "command-line",
            Source::Primary => "primary",
            Source::Secondary => "secondary",
            Source::CommandLineDefault => "command-line-default",
            Source::Baseline => "baseline",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configuration object: attribute name to dynamically typed value.
///
/// Provenance lives in a side-table so "absent" and "present with a falsy value"
/// never get confused. Equality only looks at the values.
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    values: BTreeMap<String, Value>,
    sources: BTreeMap<String, Source>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a plain map, tagging every attribute with the same source.
    pub fn from_map(values: BTreeMap<String, Value>, source: Source) -> Self {
        let sources = values.keys().map(|k| (k.clone(), source)).collect();
        Self { values, sources }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn source(&self, name: &str) -> Option<Source> {
        self.sources.get(name).copied()
    }

    /// Set an attribute, replacing any previous value and provenance.
    pub fn set(&mut self, name: impl Into<String>, value: Value, source: Source) {
        let name = name.into();
        self.sources.insert(name.clone(), source);
        self.values.insert(name, value);
    }

    /// Set an attribute only when it is not already present. Returns whether it was set.
    pub fn fill(&mut self, name: &str, value: &Value, source: Source) -> bool {
        if self.contains(name) {
            return false;
        }
        self.set(name, value.clone(), source);
        true
    }

    /// Swap the value of an existing attribute, keeping its provenance.
    pub fn replace(&mut self, name: &str, value: Value) -> Option<Value> {
        self.values.get_mut(name).map(|slot| std::mem::replace(slot, value))
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.sources.remove(name);
        self.values.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Attributes paired with their provenance.
    pub fn provenance(&self) -> impl Iterator<Item = (&str, Option<Source>)> {
        self.values.keys().map(|k| (k.as_str(), self.sources.get(k).copied()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn into_values(self) -> BTreeMap<String, Value> {
        self.values
    }

    /// Re-tag every attribute with one source, keeping the values.
    pub fn with_source(mut self, source: Source) -> Self {
        self.sources = self.values.keys().map(|k| (k.clone(), source)).collect();
        self
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// String items of a sequence attribute; a bare string counts as one item.
    pub fn get_strings(&self, name: &str) -> Option<Vec<String>> {
        match self.get(name)? {
            Value::String(s) => Some(vec![s.clone()]),
            Value::Array(items) => {
                Some(items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            }
            _ => None,
        }
    }
}

impl PartialEq for Parameters {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Serialize for Parameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

/// Short name of a value's dynamic type, for error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
