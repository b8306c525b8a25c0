//! Secondary diag file loading (`-d`)
//!
//! A JSON diag file maps group names to lists of flat records:
//!
//! ```json
//! { "mydiags": [ {"param1": 1, "param2": 2}, {"param1": "one"} ] }
//! ```
//!
//! Group names only organize the file; every record becomes one configuration
//! object. INI-style files (`.cfg`, `.ini`) yield one object per section.

use super::ini;
use crate::domain::{Parameters, Source};
use crate::error::{read_existing, ResolveError, Result};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagFormat {
    Json,
    Ini,
}

impl DiagFormat {
    pub fn detect(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
        match ext.as_str() {
            "json" => Ok(DiagFormat::Json),
            "cfg" | "ini" => Ok(DiagFormat::Ini),
            _ => Err(ResolveError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Load every record of every file, in file order.
///
/// Any failure discards the records already read.
pub fn load_secondary<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Parameters>> {
    let mut records = Vec::new();
    for path in paths {
        records.extend(load_secondary_file(path.as_ref())?);
    }
    Ok(records)
}

pub fn load_secondary_file(path: &Path) -> Result<Vec<Parameters>> {
    let format = DiagFormat::detect(path)?;
    let content = read_existing(path)?;
    let records = match format {
        DiagFormat::Json => json_records(&content, path)?,
        DiagFormat::Ini => ini_records(&content, path)?,
    };
    tracing::debug!("loaded {} record(s) from {}", records.len(), path.display());
    Ok(records)
}

fn json_records(content: &str, path: &Path) -> Result<Vec<Parameters>> {
    let raw: Value = serde_json::from_str(content).map_err(|e| ResolveError::json(path, e))?;
    let Value::Object(groups) = raw else {
        return Err(ResolveError::malformed(path, "expected a mapping of group names to lists"));
    };

    let mut records = Vec::new();
    for (group, runs) in groups {
        let Value::Array(runs) = runs else {
            return Err(ResolveError::malformed(path, format!("group '{group}' is not a list")));
        };
        for (i, run) in runs.into_iter().enumerate() {
            let Value::Object(fields) = run else {
                return Err(ResolveError::malformed(
                    path,
                    format!("record {i} of group '{group}' is not a mapping"),
                ));
            };
            records.push(Parameters::from_map(fields.into_iter().collect(), Source::Secondary));
        }
    }
    Ok(records)
}

fn ini_records(content: &str, path: &Path) -> Result<Vec<Parameters>> {
    let retitled = ini::retitle_anonymous_sections(content)?;
    let sections = ini::parse_sections(&retitled, path)?;
    Ok(sections
        .into_iter()
        .map(|section| {
            let fields = section
                .entries
                .iter()
                .map(|(key, raw)| (key.clone(), ini::decode_value(raw)))
                .collect();
            Parameters::from_map(fields, Source::Secondary)
        })
        .collect())
}
