//! Primary parameter file loading (`-p`)

use super::script;
use crate::domain::{Parameters, Source};
use crate::error::{read_existing, ResolveError, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Load the primary parameter file into one configuration object.
///
/// `.json` and `.toml` files must hold a top-level mapping. Anything else is
/// evaluated as a parameter script, and its non-private bindings become the
/// attributes.
pub fn load_primary(path: &Path) -> Result<Parameters> {
    if !path.is_file() {
        return Err(ResolveError::NotFound(path.to_path_buf()));
    }
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if file_name.matches('.').count() > 1 {
        return Err(ResolveError::Naming(path.to_path_buf()));
    }

    let content = read_existing(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();

    let bindings = match ext.as_str() {
        "json" => json_bindings(&content, path)?,
        "toml" => toml_bindings(&content, path)?,
        _ => script::exported(script::evaluate(&content, path)?),
    };

    tracing::debug!("loaded {} attribute(s) from {}", bindings.len(), path.display());
    Ok(Parameters::from_map(bindings, Source::Primary))
}

fn json_bindings(content: &str, path: &Path) -> Result<BTreeMap<String, Value>> {
    match serde_json::from_str(content).map_err(|e| ResolveError::json(path, e))? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(ResolveError::malformed(path, "parameter file must hold a mapping")),
    }
}

fn toml_bindings(content: &str, path: &Path) -> Result<BTreeMap<String, Value>> {
    let table: toml::Table = toml::from_str(content)
        .map_err(|e| ResolveError::malformed(path, format!("invalid TOML: {e}")))?;
    match serde_json::to_value(table) {
        Ok(Value::Object(map)) => Ok(map.into_iter().collect()),
        Ok(_) => Err(ResolveError::malformed(path, "parameter file must hold a table")),
        Err(e) => Err(ResolveError::json(path, e)),
    }
}
