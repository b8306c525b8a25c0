//! Rendering resolved runs and the option table

use anyhow::Result;
use serde_json::{json, Map, Value};
use std::fmt::Write;

use super::OutputFormat;
use diagconf::{OptionRegistry, Parameters};

fn run_value(params: &Parameters, provenance: bool) -> Value {
    if !provenance {
        return Value::Object(params.iter().map(|(k, v)| (k.to_string(), v.clone())).collect());
    }
    let mut out = Map::new();
    for (name, value) in params.iter() {
        let source = params.source(name).map(|s| s.as_str());
        out.insert(name.to_string(), json!({ "value": value, "source": source }));
    }
    Value::Object(out)
}

pub fn render_runs(runs: &[Parameters], format: OutputFormat, provenance: bool) -> Result<String> {
    let values: Vec<Value> = runs.iter().map(|p| run_value(p, provenance)).collect();
    let mut text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&values)?,
        OutputFormat::Jsonl => {
            let lines: Vec<String> =
                values.iter().map(serde_json::to_string).collect::<Result<_, _>>()?;
            lines.join("\n")
        }
    };
    if !text.is_empty() {
        text.push('\n');
    }
    Ok(text)
}

pub fn render_options(registry: &OptionRegistry) -> String {
    let mut out = String::new();
    for spec in registry.active() {
        let flags: Vec<&str> = spec.all_flags().collect();
        let _ = write!(out, "{:<28} {:<18} {:<5}", flags.join(", "), spec.dest, spec.kind.as_str());
        if let Some(default) = &spec.default {
            let _ = write!(out, " [default: {}]", default);
        }
        if spec.required {
            out.push_str(" [required]");
        }
        if let Some(help) = &spec.help {
            let _ = write!(out, "  {}", help);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagconf::Source;

    fn sample() -> Vec<Parameters> {
        let mut a = Parameters::new();
        a.set("vars", json!(["pr"]), Source::CommandLine);
        a.set("num", json!(1), Source::Secondary);
        let mut b = a.clone();
        b.set("vars", json!(["tas"]), Source::Primary);
        vec![a, b]
    }

    #[test]
    fn jsonl_prints_one_run_per_line() {
        let text = render_runs(&sample(), OutputFormat::Jsonl, false).expect("render");
        similar_asserts::assert_eq!(
            text,
            "{\"num\":1,\"vars\":[\"pr\"]}\n{\"num\":1,\"vars\":[\"tas\"]}\n"
        );
    }

    #[test]
    fn provenance_wraps_each_value() {
        let text = render_runs(&sample(), OutputFormat::Json, true).expect("render");
        let parsed: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(parsed[0]["vars"]["source"], json!("command-line"));
        assert_eq!(parsed[1]["vars"]["value"], json!(["tas"]));
        assert_eq!(parsed[1]["num"]["source"], json!("secondary"));
    }

    #[test]
    fn option_table_lists_baseline_flags() {
        let registry = OptionRegistry::with_baseline();
        let table = render_options(&registry);
        assert!(table.contains("-p, --parameters"));
        assert!(table.contains("other_parameters"));
        assert_eq!(table.lines().count(), registry.len());
    }
}
