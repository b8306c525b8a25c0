//! diagconf: resolve diagnostics run configurations
//!
//! Builds the final list of run configurations for a diagnostics job from
//! command-line flags, a primary parameter file and any number of diag files,
//! then expands configurations that ask for granulation.

pub mod cmdline;
pub mod config;
pub mod domain;
pub mod error;
pub mod granulate;
pub mod options;
pub mod resolve;

pub use cmdline::{CommandLine, ParsedArgs};
pub use config::Combiner;
pub use domain::{MapTemplate, NoDefaults, Parameters, Source, Template};
pub use error::{ResolveError, Result};
pub use granulate::{granulate, granulate_all};
pub use options::{OptionRegistry, OptionSpec};
pub use resolve::Resolver;
