//! Parameter templates: baseline defaults and value checks

use crate::domain::{Parameters, Source};
use crate::error::{read_existing, ResolveError, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// The "class" of a configuration object.
///
/// Supplies the lowest-precedence baseline defaults and an optional check run
/// on every combined object.
pub trait Template {
    fn defaults(&self) -> Parameters {
        Parameters::new()
    }

    fn check_values(&self, _params: &Parameters) -> Result<()> {
        Ok(())
    }
}

/// A template with no baseline defaults and no checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDefaults;

impl Template for NoDefaults {}

/// A template whose defaults come from a plain map, optionally requiring some attributes.
#[derive(Debug, Clone, Default)]
pub struct MapTemplate {
    defaults: BTreeMap<String, Value>,
    required: Vec<String>,
}

impl MapTemplate {
    pub fn new(defaults: BTreeMap<String, Value>) -> Self {
        Self { defaults, required: Vec::new() }
    }

    /// Attributes that must be present (and non-null) after combining.
    pub fn require<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    /// Load defaults from a JSON document whose top level is a mapping.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = read_existing(path)?;
        let raw: Value =
            serde_json::from_str(&content).map_err(|e| ResolveError::json(path, e))?;
        match raw {
            Value::Object(map) => Ok(Self::new(map.into_iter().collect())),
            _ => Err(ResolveError::malformed(path, "defaults must be a JSON object")),
        }
    }
}

impl Template for MapTemplate {
    fn defaults(&self) -> Parameters {
        Parameters::from_map(self.defaults.clone(), Source::Baseline)
    }

    fn check_values(&self, params: &Parameters) -> Result<()> {
        for name in &self.required {
            match params.get(name) {
                None | Some(Value::Null) => {
                    return Err(ResolveError::Type(format!(
                        "required attribute '{name}' is not set"
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}
