//! External option-spec files
//!
//! A spec file is a JSON (or YAML) mapping. Every top-level key starting with
//! `-` declares one option:
//!
//! ```json
//! {
//!     "-v": {
//!         "aliases": ["--vars"],
//!         "type": "str",
//!         "nargs": "+",
//!         "dest": "vars",
//!         "help": "Variables to use"
//!     }
//! }
//! ```
//!
//! Entries that cannot be turned into an option are skipped with a warning.

use super::spec::{Arity, OptionSpec, ValueKind};
use crate::error::{read_existing, ResolveError, Result};
use serde_json::{Map, Value};
use std::path::Path;

pub fn read_option_specs(path: &Path) -> Result<Vec<OptionSpec>> {
    let content = read_existing(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();

    let raw: Value = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content)
            .map_err(|e| ResolveError::malformed(path, format!("invalid YAML: {e}")))?,
        _ => serde_json::from_str(&content).map_err(|e| ResolveError::json(path, e))?,
    };

    let Value::Object(entries) = raw else {
        return Err(ResolveError::malformed(path, "option spec must be a mapping of flags"));
    };

    let mut specs = Vec::new();
    for (key, entry) in entries {
        if !key.starts_with('-') {
            tracing::debug!("{}: ignoring non-option key '{}'", path.display(), key);
            continue;
        }
        match option_from_entry(&key, &entry) {
            Ok(spec) => specs.push(spec),
            Err(reason) => {
                tracing::warn!("{}: skipping option '{}': {}", path.display(), key, reason);
            }
        }
    }
    tracing::debug!("loaded {} option(s) from {}", specs.len(), path.display());
    Ok(specs)
}

fn option_from_entry(key: &str, entry: &Value) -> std::result::Result<OptionSpec, String> {
    let empty = Map::new();
    let fields = match entry {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => return Err(format!("expected a mapping, got {other}")),
    };

    let mut spec = OptionSpec::new([key]).map_err(|e| e.to_string())?;

    if let Some(aliases) = fields.get("aliases") {
        let aliases = string_list(aliases).ok_or("'aliases' must be a list of strings")?;
        spec = spec.aliases(aliases).map_err(|e| e.to_string())?;
        // The dest of `-v` with alias `--vars` is `vars`, as if both were flags.
        let all: Vec<String> = spec.all_flags().map(str::to_string).collect();
        let derived = OptionSpec::new(all).map_err(|e| e.to_string())?.dest;
        spec = spec.dest(derived);
    }

    if let Some(dest) = fields.get("dest") {
        let dest = dest.as_str().ok_or("'dest' must be a string")?;
        spec = spec.dest(dest);
    }

    if let Some(kind) = fields.get("type") {
        let name = kind.as_str().ok_or("'type' must be a string")?;
        let kind = ValueKind::from_name(name).ok_or_else(|| format!("unknown type '{name}'"))?;
        spec = spec.kind(kind);
    }

    if let Some(nargs) = fields.get("nargs") {
        spec = spec.arity(parse_nargs(nargs)?);
    }

    if let Some(action) = fields.get("action") {
        let action = action.as_str().ok_or("'action' must be a string")?;
        let arity = match action {
            "store" => spec.arity,
            "store_true" => Arity::Switch(true),
            "store_false" => Arity::Switch(false),
            "append" => Arity::Append,
            other => return Err(format!("unsupported action '{other}'")),
        };
        spec = spec.arity(arity);
    }

    if let Some(default) = fields.get("default") {
        if !default.is_null() {
            spec = spec.default_value(default.clone());
        }
    }

    if let Some(help) = fields.get("help") {
        let help = help.as_str().ok_or("'help' must be a string")?;
        spec = spec.help(help);
    }

    if let Some(required) = fields.get("required") {
        let required = required.as_bool().ok_or("'required' must be a boolean")?;
        spec = spec.required(required);
    }

    if let Some(choices) = fields.get("choices") {
        let choices = choices
            .as_array()
            .ok_or("'choices' must be a list")?
            .iter()
            .map(|c| match c {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>();
        spec = spec.choices(choices);
    }

    Ok(spec)
}

fn parse_nargs(nargs: &Value) -> std::result::Result<Arity, String> {
    match nargs {
        Value::String(s) => match s.as_str() {
            "+" => Ok(Arity::AtLeastOne),
            "*" => Ok(Arity::Any),
            "?" => Ok(Arity::Optional),
            other => other
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .map(Arity::Exactly)
                .ok_or_else(|| format!("unsupported nargs '{other}'")),
        },
        Value::Number(n) => n
            .as_u64()
            .filter(|n| *n > 0)
            .map(|n| Arity::Exactly(n as usize))
            .ok_or_else(|| format!("unsupported nargs {n}")),
        other => Err(format!("unsupported nargs {other}")),
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => items.iter().map(|v| v.as_str().map(str::to_string)).collect(),
        _ => None,
    }
}
