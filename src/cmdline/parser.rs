//! Command-line resolver
//!
//! Parsing yields typed values, but a typed value cannot tell "left at its
//! default" apart from "explicitly set to the default". The literal tokens are
//! therefore kept next to the parsed values and scanned again on demand.

use super::command::build_command;
use crate::error::{ResolveError, Result};
use crate::options::{Arity, OptionRegistry, OptionSpec};
use clap::parser::ValueSource;
use clap::ArgMatches;
use serde_json::Value;
use std::collections::BTreeMap;

/// Parses raw arguments against the active options of a registry.
pub struct CommandLine<'a> {
    registry: &'a OptionRegistry,
}

impl<'a> CommandLine<'a> {
    pub fn new(registry: &'a OptionRegistry) -> Self {
        Self { registry }
    }

    /// Parse the arguments this process was invoked with.
    pub fn parse(&self) -> Result<ParsedArgs> {
        self.parse_from(std::env::args().skip(1))
    }

    /// Parse an explicit argument list (without the program name).
    pub fn parse_from<I, S>(&self, argv: I) -> Result<ParsedArgs>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = argv.into_iter().map(Into::into).collect();
        let matches = build_command(self.registry)
            .try_get_matches_from(&tokens)
            .map_err(|e| ResolveError::Arguments(e.render().to_string().trim_end().to_string()))?;

        let mut values = BTreeMap::new();
        let mut flags = BTreeMap::new();
        for spec in self.registry.active() {
            flags.insert(spec.dest.clone(), spec.all_flags().map(str::to_string).collect());
            let given = matches.value_source(&spec.dest) == Some(ValueSource::CommandLine);
            let value =
                if given { Some(explicit_value(spec, &matches)?) } else { spec.default.clone() };
            if let Some(value) = value {
                values.insert(spec.dest.clone(), value);
            }
        }

        tracing::debug!("parsed {} option value(s) from {} token(s)", values.len(), tokens.len());
        Ok(ParsedArgs { values, tokens, flags })
    }
}

fn explicit_value(spec: &OptionSpec, matches: &ArgMatches) -> Result<Value> {
    if let Arity::Switch(on) = spec.arity {
        return Ok(Value::Bool(on));
    }

    let occurrences: Vec<Vec<String>> = matches
        .get_raw_occurrences(&spec.dest)
        .map(|occ| {
            occ.map(|vals| vals.map(|v| v.to_string_lossy().into_owned()).collect()).collect()
        })
        .unwrap_or_default();

    let convert_all = |raw: &[String]| -> Result<Vec<Value>> {
        raw.iter().map(|r| spec.convert(r)).collect()
    };

    match spec.arity {
        Arity::Single | Arity::Optional => {
            let last = occurrences.last().and_then(|occ| occ.last());
            match last {
                Some(raw) => spec.convert(raw),
                None => Ok(Value::Null),
            }
        }
        Arity::Exactly(_) => {
            let last = occurrences.last().map(Vec::as_slice).unwrap_or_default();
            Ok(Value::Array(convert_all(last)?))
        }
        _ => {
            let flat: Vec<String> = occurrences.into_iter().flatten().collect();
            Ok(Value::Array(convert_all(&flat)?))
        }
    }
}

/// Typed option values plus the literal tokens they were parsed from.
#[derive(Debug, Clone, Default)]
pub struct ParsedArgs {
    values: BTreeMap<String, Value>,
    tokens: Vec<String>,
    flags: BTreeMap<String, Vec<String>>,
}

impl ParsedArgs {
    /// Value of an option, whether given explicitly or defaulted.
    pub fn get(&self, dest: &str) -> Option<&Value> {
        self.values.get(dest)
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// True unless one of the option's flag strings appears in the literal tokens,
    /// either alone or as the `flag` part of a `flag=value` token.
    pub fn is_default_value(&self, dest: &str) -> bool {
        let Some(flags) = self.flags.get(dest) else {
            return true;
        };
        !self.tokens.iter().any(|token| {
            let head = token.split('=').next().unwrap_or(token.as_str());
            flags.iter().any(|flag| flag == token || flag == head)
        })
    }

    /// Options the user supplied explicitly.
    pub fn explicit(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values
            .iter()
            .filter(|(dest, _)| !self.is_default_value(dest))
            .map(|(dest, value)| (dest.as_str(), value))
    }

    /// Options holding their fallback default.
    pub fn defaults(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values
            .iter()
            .filter(|(dest, _)| self.is_default_value(dest))
            .map(|(dest, value)| (dest.as_str(), value))
    }

    /// String items of an option value; a single string counts as one item.
    pub fn get_strings(&self, dest: &str) -> Vec<String> {
        match self.get(dest) {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => {
                items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{OptionSpec, ValueKind, PRIMARY_DEST, SECONDARY_DEST};
    use serde_json::json;

    fn registry_with_vars() -> OptionRegistry {
        let mut registry = OptionRegistry::with_baseline();
        registry.register(OptionSpec::new(["-v", "--vars"]).expect("spec").many());
        registry.register(
            OptionSpec::new(["--num_years"]).expect("spec").kind(ValueKind::Int).default_value(30),
        );
        registry
    }

    #[test]
    fn parses_multi_valued_option() {
        let registry = registry_with_vars();
        let parsed = CommandLine::new(&registry).parse_from(["-v", "v1", "v2"]).expect("parse");
        assert_eq!(parsed.get("vars"), Some(&json!(["v1", "v2"])));
        assert!(!parsed.is_default_value("vars"));
    }

    #[test]
    fn default_is_reported_as_default() {
        let registry = registry_with_vars();
        let parsed = CommandLine::new(&registry).parse_from(["-p", "params.py"]).expect("parse");
        assert_eq!(parsed.get("num_years"), Some(&json!(30)));
        assert!(parsed.is_default_value("num_years"));
        assert!(!parsed.is_default_value(PRIMARY_DEST));
        assert_eq!(parsed.get(PRIMARY_DEST), Some(&json!("params.py")));
    }

    #[test]
    fn explicit_value_equal_to_default_is_still_explicit() {
        let registry = registry_with_vars();
        let parsed = CommandLine::new(&registry).parse_from(["--num_years=30"]).expect("parse");
        assert_eq!(parsed.get("num_years"), Some(&json!(30)));
        assert!(!parsed.is_default_value("num_years"));
        let explicit: Vec<&str> = parsed.explicit().map(|(k, _)| k).collect();
        assert_eq!(explicit, vec!["num_years"]);
    }

    #[test]
    fn options_without_default_are_absent() {
        let registry = registry_with_vars();
        let parsed = CommandLine::new(&registry).parse_from(Vec::<String>::new()).expect("parse");
        assert!(parsed.get(SECONDARY_DEST).is_none());
        assert!(parsed.get("vars").is_none());
        assert_eq!(parsed.defaults().count(), 1);
    }

    #[test]
    fn repeated_multi_valued_option_accumulates() {
        let registry = registry_with_vars();
        let parsed = CommandLine::new(&registry)
            .parse_from(["-d", "a.json", "b.cfg", "--diags", "c.json"])
            .expect("parse");
        assert_eq!(parsed.get(SECONDARY_DEST), Some(&json!(["a.json", "b.cfg", "c.json"])));
    }

    #[test]
    fn single_valued_option_keeps_last_occurrence() {
        let registry = registry_with_vars();
        let parsed = CommandLine::new(&registry)
            .parse_from(["-n", "2", "--num_workers", "8"])
            .expect("parse");
        assert_eq!(parsed.get("num_workers"), Some(&json!(8)));
    }

    #[test]
    fn bad_integer_is_a_type_error() {
        let registry = registry_with_vars();
        let err = CommandLine::new(&registry).parse_from(["-n", "many"]).unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn unknown_flag_is_an_argument_error() {
        let registry = registry_with_vars();
        let err = CommandLine::new(&registry).parse_from(["--bogus"]).unwrap_err();
        assert!(matches!(err, ResolveError::Arguments(_)));
    }

    #[test]
    fn switch_stores_its_value_only_when_present() {
        let mut registry = OptionRegistry::with_baseline();
        registry.register(OptionSpec::new(["--dry-run"]).expect("spec").arity(Arity::Switch(true)));
        let cli = CommandLine::new(&registry);
        let absent = cli.parse_from(Vec::<String>::new()).expect("parse");
        assert_eq!(absent.get("dry_run"), Some(&json!(false)));
        assert!(absent.is_default_value("dry_run"));
        let present = cli.parse_from(["--dry-run"]).expect("parse");
        assert_eq!(present.get("dry_run"), Some(&json!(true)));
    }
}
