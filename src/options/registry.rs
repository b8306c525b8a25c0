//! Default option registry
//!
//! Options are kept newest-first. Registering an option replaces any older
//! option with the same destination and takes over any flag strings it shares
//! with older options, so embedding code can override the built-in baseline.

use super::spec::{OptionSpec, ValueKind};
use super::spec_file;
use crate::error::{ResolveError, Result};
use std::collections::BTreeSet;
use std::path::Path;

pub const PRIMARY_DEST: &str = "parameters";
pub const SECONDARY_DEST: &str = "other_parameters";
pub const NUM_WORKERS_DEST: &str = "num_workers";
pub const SCHEDULER_DEST: &str = "scheduler_addr";
pub const GRANULATE_DEST: &str = "granulate";

#[derive(Debug, Clone, Default)]
pub struct OptionRegistry {
    options: Vec<OptionSpec>,
    active: Option<BTreeSet<String>>,
}

impl OptionRegistry {
    /// An empty registry with no baseline options.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding the built-in baseline options.
    pub fn with_baseline() -> Self {
        let mut registry = Self::empty();
        for spec in baseline_options() {
            registry.register(spec);
        }
        registry
    }

    /// Register an option ahead of every existing one.
    pub fn register(&mut self, spec: OptionSpec) -> &mut Self {
        self.options.retain(|existing| existing.dest != spec.dest);
        let flags: Vec<String> = spec.all_flags().map(str::to_string).collect();
        self.options.retain_mut(|existing| {
            let mut keep = true;
            for flag in &flags {
                if existing.has_flag(flag) {
                    tracing::debug!(
                        "option {} overrides flag {} of '{}'",
                        spec.dest,
                        flag,
                        existing.dest
                    );
                    keep = existing.strip_flag(flag);
                }
            }
            keep
        });
        self.options.insert(0, spec);
        self
    }

    /// Register every option described by external option-spec files.
    ///
    /// Returns how many options were registered; malformed entries are skipped.
    pub fn load_from_spec_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<usize> {
        let mut registered = 0;
        for path in paths {
            for spec in spec_file::read_option_specs(path.as_ref())? {
                self.register(spec);
                registered += 1;
            }
        }
        Ok(registered)
    }

    /// Restrict the active options to the named ones.
    ///
    /// A name matches a flag exactly, or after prefixing `-` or `--` when given bare.
    pub fn select_subset<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selected = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            let spec = self.find_flag(name).or_else(|| {
                if name.starts_with('-') {
                    None
                } else {
                    self.find_flag(&format!("-{name}"))
                        .or_else(|| self.find_flag(&format!("--{name}")))
                }
            });
            match spec {
                Some(spec) => {
                    selected.insert(spec.dest.clone());
                }
                None => return Err(ResolveError::UnknownOption(name.to_string())),
            }
        }
        self.active = Some(selected);
        Ok(())
    }

    /// Make every registered option active again.
    pub fn select_all(&mut self) {
        self.active = None;
    }

    /// Options currently in effect, newest first.
    pub fn active(&self) -> impl Iterator<Item = &OptionSpec> {
        self.options.iter().filter(|spec| match &self.active {
            Some(selected) => selected.contains(&spec.dest),
            None => true,
        })
    }

    /// Every registered option, newest first, regardless of subset selection.
    pub fn iter(&self) -> impl Iterator<Item = &OptionSpec> {
        self.options.iter()
    }

    pub fn get(&self, dest: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|spec| spec.dest == dest)
    }

    pub fn find_flag(&self, flag: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|spec| spec.has_flag(flag))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

fn baseline_options() -> Vec<OptionSpec> {
    let new = OptionSpec::builtin;
    vec![
        new(&["-p", "--parameters"])
            .dest(PRIMARY_DEST)
            .kind(ValueKind::Path)
            .help("Path to the user-defined parameter file"),
        new(&["-d", "--diags"])
            .dest(SECONDARY_DEST)
            .kind(ValueKind::Path)
            .many()
            .help("Path to the other user-defined parameter file(s)"),
        new(&["-n", "--num_workers"])
            .dest(NUM_WORKERS_DEST)
            .kind(ValueKind::Int)
            .help("Number of workers, used when running in parallel"),
        new(&["--scheduler_addr"])
            .dest(SCHEDULER_DEST)
            .help("Address of the scheduler in the form of IP_ADDRESS:PORT"),
        new(&["-g", "--granulate"])
            .dest(GRANULATE_DEST)
            .many()
            .help("Attributes whose values are split into one run per combination"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::spec::validate_flag;
    use crate::options::Arity;

    #[test]
    fn baseline_has_all_builtin_options() {
        let registry = OptionRegistry::with_baseline();
        let baseline =
            [PRIMARY_DEST, SECONDARY_DEST, NUM_WORKERS_DEST, SCHEDULER_DEST, GRANULATE_DEST];
        for dest in baseline {
            assert!(registry.get(dest).is_some(), "missing {dest}");
        }
        assert_eq!(registry.get(SECONDARY_DEST).map(|s| s.arity), Some(Arity::AtLeastOne));
    }

    #[test]
    fn baseline_flags_are_valid() {
        for spec in baseline_options() {
            assert!(!spec.flags.is_empty(), "{} has no flags", spec.dest);
            for flag in &spec.flags {
                assert!(validate_flag(flag).is_ok(), "invalid baseline flag {flag}");
            }
            let rebuilt = OptionSpec::new(spec.flags.iter().cloned()).expect("valid flags");
            assert_eq!(rebuilt.flags, spec.flags);
        }
    }

    #[test]
    fn later_registration_replaces_same_dest() {
        let mut registry = OptionRegistry::with_baseline();
        let spec = OptionSpec::new(["-P", "--param-file"]).expect("spec").dest(PRIMARY_DEST);
        registry.register(spec);
        let active = registry.get(PRIMARY_DEST).expect("primary");
        assert!(active.has_flag("--param-file"));
        assert!(registry.find_flag("-p").is_none());
        assert_eq!(registry.iter().next().map(|s| s.dest.as_str()), Some(PRIMARY_DEST));
    }

    #[test]
    fn later_registration_takes_shared_flags() {
        let mut registry = OptionRegistry::with_baseline();
        let spec = OptionSpec::new(["-n", "--name"]).expect("spec");
        registry.register(spec);
        assert_eq!(registry.find_flag("-n").map(|s| s.dest.as_str()), Some("name"));
        let workers = registry.get(NUM_WORKERS_DEST).expect("num_workers survives");
        assert!(!workers.has_flag("-n"));
        assert!(workers.has_flag("--num_workers"));
    }

    #[test]
    fn option_losing_every_flag_is_dropped() {
        let mut registry = OptionRegistry::with_baseline();
        registry.register(OptionSpec::new(["--scheduler_addr"]).expect("spec").dest("scheduler"));
        assert!(registry.get(SCHEDULER_DEST).is_none());
        assert!(registry.get("scheduler").is_some());
    }

    #[test]
    fn subset_matches_bare_and_dashed_names() {
        let mut registry = OptionRegistry::with_baseline();
        registry.select_subset(["p", "diags", "--granulate"]).expect("subset");
        let active: Vec<&str> = registry.active().map(|s| s.dest.as_str()).collect();
        assert_eq!(active.len(), 3);
        assert!(active.contains(&PRIMARY_DEST));
        assert!(active.contains(&SECONDARY_DEST));
        assert!(active.contains(&GRANULATE_DEST));

        registry.select_all();
        assert_eq!(registry.active().count(), registry.len());
    }

    #[test]
    fn subset_rejects_unknown_option() {
        let mut registry = OptionRegistry::with_baseline();
        let err = registry.select_subset(["--nope"]).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownOption(name) if name == "--nope"));
    }
}
