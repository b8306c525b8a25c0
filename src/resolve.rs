//! One resolution pass: command line, primary file, diag files, combine, granulate

use crate::cmdline::{CommandLine, ParsedArgs};
use crate::config::{load_primary, load_secondary, Combiner};
use crate::domain::{NoDefaults, Parameters, Template};
use crate::error::Result;
use crate::granulate::granulate_all;
use crate::options::{OptionRegistry, PRIMARY_DEST, SECONDARY_DEST};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Builder for a single resolution pass over a registry.
///
/// Nothing is kept between passes; any failure aborts the pass and no
/// partial list is returned.
pub struct Resolver<'a> {
    registry: &'a OptionRegistry,
    template: &'a dyn Template,
    ignore: BTreeSet<String>,
    diag_files: Option<Vec<PathBuf>>,
    granulate: bool,
    check_values: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a OptionRegistry) -> Self {
        Self {
            registry,
            template: &NoDefaults,
            ignore: BTreeSet::new(),
            diag_files: None,
            granulate: true,
            check_values: true,
        }
    }

    /// Template supplying baseline defaults and value checks.
    pub fn template(mut self, template: &'a dyn Template) -> Self {
        self.template = template;
        self
    }

    pub fn ignore<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(names.into_iter().map(Into::into));
        self
    }

    /// Read these diag files instead of the ones named on the command line.
    pub fn diag_files<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.diag_files = Some(paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect());
        self
    }

    pub fn granulate(mut self, enabled: bool) -> Self {
        self.granulate = enabled;
        self
    }

    pub fn check_values(mut self, enabled: bool) -> Self {
        self.check_values = enabled;
        self
    }

    /// Resolve against the arguments this process was invoked with.
    pub fn resolve(&self) -> Result<Vec<Parameters>> {
        let cmdline = CommandLine::new(self.registry).parse()?;
        self.resolve_parsed(&cmdline)
    }

    /// Resolve against an explicit argument list (program name excluded).
    pub fn resolve_from<I, S>(&self, argv: I) -> Result<Vec<Parameters>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cmdline = CommandLine::new(self.registry).parse_from(argv)?;
        self.resolve_parsed(&cmdline)
    }

    pub fn resolve_parsed(&self, cmdline: &ParsedArgs) -> Result<Vec<Parameters>> {
        let primary = match cmdline.get_strings(PRIMARY_DEST).last() {
            Some(path) => {
                tracing::debug!("loading primary parameters from {}", path);
                Some(load_primary(Path::new(path))?)
            }
            None => None,
        };

        let diag_files: Vec<PathBuf> = match &self.diag_files {
            Some(paths) => paths.clone(),
            None => cmdline.get_strings(SECONDARY_DEST).into_iter().map(PathBuf::from).collect(),
        };
        let records = load_secondary(&diag_files)?;

        let combined = Combiner::new(self.template)
            .ignore(self.ignore.iter().cloned())
            .check_values(self.check_values)
            .combine(Some(cmdline), primary.as_ref(), &records)?;

        if self.granulate {
            granulate_all(&combined)
        } else {
            Ok(combined)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Source;
    use crate::error::ResolveError;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn command_line_only_pass_yields_one_object() {
        let registry = OptionRegistry::with_baseline();
        let out = Resolver::new(&registry)
            .resolve_from(["-n", "4", "--scheduler_addr", "tcp://host:8786"])
            .expect("resolve");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("num_workers"), Some(&json!(4)));
        assert_eq!(out[0].get("scheduler_addr"), Some(&json!("tcp://host:8786")));
        assert_eq!(out[0].source("num_workers"), Some(Source::CommandLine));
    }

    #[test]
    fn primary_and_diags_are_read_from_flags() {
        let tmp = TempDir::new().expect("tmp");
        let params = tmp.path().join("params.py");
        let diags = tmp.path().join("diags.json");
        fs::write(&params, "case_id = \"run\"\nnum = 10\n").expect("write");
        fs::write(&diags, r#"{"g": [{"num": 1, "sets": ["a"]}, {"sets": ["b"]}]}"#)
            .expect("write");

        let registry = OptionRegistry::with_baseline();
        let out = Resolver::new(&registry)
            .resolve_from([
                "-p".to_string(),
                params.display().to_string(),
                "-d".to_string(),
                diags.display().to_string(),
            ])
            .expect("resolve");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get("num"), Some(&json!(10)));
        assert_eq!(out[1].get("sets"), Some(&json!(["b"])));
        assert_eq!(out[1].get("case_id"), Some(&json!("run")));
    }

    #[test]
    fn explicit_diag_list_replaces_flag_values() {
        let tmp = TempDir::new().expect("tmp");
        let diags = tmp.path().join("diags.cfg");
        fs::write(&diags, "[a]\nnum = 1\n[b]\nnum = 2\n[c]\nnum = 3\n").expect("write");

        let registry = OptionRegistry::with_baseline();
        let out = Resolver::new(&registry)
            .diag_files([&diags])
            .resolve_from(["-d", "ignored.json"])
            .expect("resolve");
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn granulation_can_be_switched_off() {
        let tmp = TempDir::new().expect("tmp");
        let params = tmp.path().join("params.py");
        fs::write(&params, "vars = [\"pr\", \"tas\"]\ngranulate = [\"vars\"]\n").expect("write");
        let registry = OptionRegistry::with_baseline();
        let argv = ["-p".to_string(), params.display().to_string()];

        let expanded = Resolver::new(&registry).resolve_from(argv.clone()).expect("resolve");
        assert_eq!(expanded.len(), 2);
        let flat = Resolver::new(&registry).granulate(false).resolve_from(argv).expect("resolve");
        assert_eq!(flat.len(), 1);
    }

    #[test]
    fn failing_diag_file_discards_everything() {
        let tmp = TempDir::new().expect("tmp");
        let good = tmp.path().join("diags.json");
        fs::write(&good, r#"{"g": [{"num": 1}]}"#).expect("write");
        let registry = OptionRegistry::with_baseline();
        let err = Resolver::new(&registry)
            .diag_files([good, tmp.path().join("diags.xyz")])
            .resolve_from(Vec::<String>::new())
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedFormat(_)));
    }
}
