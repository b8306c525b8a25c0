//! Combining command-line, primary and secondary sources
//!
//! Precedence, highest first; a lower tier only fills attributes still unset:
//!
//! 1. values given explicitly on the command line
//! 2. the primary parameter file
//! 3. the secondary record being combined
//! 4. command-line option defaults
//! 5. baseline defaults of the template
//!
//! Secondary records decide how many objects come out; the primary file and
//! command line are shared by all of them and win per attribute.

use crate::cmdline::ParsedArgs;
use crate::domain::{Parameters, Source, Template};
use crate::error::Result;
use std::collections::BTreeSet;

pub struct Combiner<'t> {
    template: &'t dyn Template,
    ignore: BTreeSet<String>,
    check_values: bool,
}

impl<'t> Combiner<'t> {
    pub fn new(template: &'t dyn Template) -> Self {
        Self { template, ignore: BTreeSet::new(), check_values: true }
    }

    /// Attributes each secondary record keeps for itself, even when the
    /// primary file or command line also defines them.
    pub fn ignore<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(names.into_iter().map(Into::into));
        self
    }

    /// Whether to run the template's value checks on every combined object.
    pub fn check_values(mut self, enabled: bool) -> Self {
        self.check_values = enabled;
        self
    }

    /// Fold the sources into the final list: one object per secondary record,
    /// or exactly one object when there are no records.
    pub fn combine(
        &self,
        cmdline: Option<&ParsedArgs>,
        primary: Option<&Parameters>,
        secondary: &[Parameters],
    ) -> Result<Vec<Parameters>> {
        let combined: Vec<Parameters> = if secondary.is_empty() {
            vec![self.combine_one(cmdline, primary, None)]
        } else {
            secondary
                .iter()
                .map(|record| self.combine_one(cmdline, primary, Some(record)))
                .collect()
        };

        if self.check_values {
            for params in &combined {
                self.template.check_values(params)?;
            }
        }
        tracing::debug!("combined {} configuration object(s)", combined.len());
        Ok(combined)
    }

    fn combine_one(
        &self,
        cmdline: Option<&ParsedArgs>,
        primary: Option<&Parameters>,
        record: Option<&Parameters>,
    ) -> Parameters {
        // The ignore set only matters when a record brings its own values.
        let shared = |name: &str| record.is_none() || !self.ignore.contains(name);
        let mut out = Parameters::new();

        if let Some(cmdline) = cmdline {
            for (name, value) in cmdline.explicit().filter(|(name, _)| shared(*name)) {
                out.fill(name, value, Source::CommandLine);
            }
        }
        if let Some(primary) = primary {
            for (name, value) in primary.iter().filter(|(name, _)| shared(*name)) {
                out.fill(name, value, Source::Primary);
            }
        }
        if let Some(record) = record {
            for (name, value) in record.iter() {
                out.fill(name, value, Source::Secondary);
            }
        }
        if let Some(cmdline) = cmdline {
            for (name, value) in cmdline.defaults().filter(|(name, _)| shared(*name)) {
                out.fill(name, value, Source::CommandLineDefault);
            }
        }
        for (name, value) in self.template.defaults().iter() {
            out.fill(name, value, Source::Baseline);
        }
        out
    }
}
