//! Granulation: one configuration object per combination of listed attributes
//!
//! An object whose `granulate` attribute names other attributes is expanded
//! into the cartesian product of those attributes' sequences. The first name
//! varies slowest. Each output holds a single-element sequence for every
//! granulated attribute and shares everything else with the input.

use crate::domain::parameters::type_name;
use crate::domain::Parameters;
use crate::error::{ResolveError, Result};
use crate::options::GRANULATE_DEST;
use serde_json::Value;

/// Expand one object. Objects without a (non-empty) `granulate` list pass through.
pub fn granulate(params: &Parameters) -> Result<Vec<Parameters>> {
    let names = granulate_names(params)?;
    if names.is_empty() {
        return Ok(vec![params.clone()]);
    }

    let mut dimensions: Vec<(&str, &[Value])> = Vec::with_capacity(names.len());
    for name in &names {
        match params.get(name) {
            None => return Err(ResolveError::MissingAttribute(name.clone())),
            Some(Value::Array(items)) if items.is_empty() => {
                tracing::debug!("granulate: '{}' is empty, skipping", name);
            }
            Some(Value::Array(items)) => dimensions.push((name.as_str(), items.as_slice())),
            Some(other) => {
                return Err(ResolveError::NotIterable {
                    name: name.clone(),
                    found: type_name(other),
                });
            }
        }
    }

    let mut combinations: Vec<Vec<&Value>> = vec![Vec::new()];
    for (_, items) in &dimensions {
        combinations = combinations
            .iter()
            .flat_map(|prefix| {
                items.iter().map(move |item| {
                    let mut combo = prefix.clone();
                    combo.push(item);
                    combo
                })
            })
            .collect();
    }

    let expanded: Vec<Parameters> = combinations
        .into_iter()
        .map(|combo| {
            let mut copy = params.clone();
            for ((name, _), item) in dimensions.iter().zip(combo) {
                copy.replace(name, Value::Array(vec![item.clone()]));
            }
            copy
        })
        .collect();
    tracing::debug!(
        "granulate: {} attribute(s) expanded into {} run(s)",
        dimensions.len(),
        expanded.len()
    );
    Ok(expanded)
}

/// Expand every object of a list, keeping list order.
pub fn granulate_all(list: &[Parameters]) -> Result<Vec<Parameters>> {
    let mut out = Vec::with_capacity(list.len());
    for params in list {
        out.extend(granulate(params)?);
    }
    Ok(out)
}

fn granulate_names(params: &Parameters) -> Result<Vec<String>> {
    match params.get(GRANULATE_DEST) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(name)) => Ok(vec![name.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ResolveError::Type(format!(
                        "granulate entries must be attribute names, got {}",
                        type_name(item)
                    ))
                })
            })
            .collect(),
        Some(other) => Err(ResolveError::NotIterable {
            name: GRANULATE_DEST.to_string(),
            found: type_name(other),
        }),
    }
}
