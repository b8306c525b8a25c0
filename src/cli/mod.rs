//! Command-line interface for diagconf
//!
//! Everything after `--` is the job's own argument list, resolved against the
//! option registry; the flags before it configure the resolution itself.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use diagconf::{MapTemplate, OptionRegistry, Resolver};

mod output;

/// Resolve diagnostics run configurations from flags, parameter and diag files
#[derive(Parser)]
#[command(name = "diagconf")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Example: diagconf --ignore vars -- -p params.py -d diags.cfg -g vars")]
pub struct Cli {
    /// Option specification files (JSON or YAML) to register (repeatable or comma-separated)
    #[arg(
        long = "options",
        value_name = "FILE",
        env = "DIAGCONF_OPTIONS",
        value_delimiter = ','
    )]
    option_files: Vec<PathBuf>,

    /// Only recognize these options, by flag or bare name (repeatable or comma-separated)
    #[arg(long = "use", value_name = "NAME", value_delimiter = ',')]
    use_options: Vec<String>,

    /// Baseline defaults applied to every run (JSON object)
    #[arg(long, value_name = "FILE")]
    defaults: Option<PathBuf>,

    /// Attributes that must be set in every resolved run
    #[arg(long, value_name = "NAME", value_delimiter = ',')]
    require: Vec<String>,

    /// Attributes each diag record keeps even when set elsewhere
    #[arg(long, value_name = "NAME", value_delimiter = ',')]
    ignore: Vec<String>,

    /// Do not expand runs that carry a granulate list
    #[arg(long)]
    no_granulate: bool,

    /// Skip the value checks on combined runs
    #[arg(long)]
    no_check: bool,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "json")]
    format: OutputFormat,

    /// Print where every attribute's value came from
    #[arg(long)]
    provenance: bool,

    /// List the active options and exit
    #[arg(long)]
    list_options: bool,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long)]
    verbose: bool,

    /// Arguments of the diagnostics job
    #[arg(last = true, value_name = "JOB_ARGS", allow_hyphen_values = true)]
    job_args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON array holding every run
    Json,
    /// One JSON object per line
    Jsonl,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let mut registry = OptionRegistry::with_baseline();
    let loaded = registry
        .load_from_spec_files(&cli.option_files)
        .context("Failed to load option specification files")?;
    tracing::debug!("registered {} option(s) from specification files", loaded);
    if !cli.use_options.is_empty() {
        registry.select_subset(&cli.use_options)?;
    }

    if cli.list_options {
        print!("{}", output::render_options(&registry));
        return Ok(());
    }

    let template = match &cli.defaults {
        Some(path) => MapTemplate::from_file(path)
            .with_context(|| format!("Failed to load defaults from {}", path.display()))?,
        None => MapTemplate::default(),
    }
    .require(cli.require.iter().cloned());

    let runs = Resolver::new(&registry)
        .template(&template)
        .ignore(cli.ignore.iter().cloned())
        .granulate(!cli.no_granulate)
        .check_values(!cli.no_check)
        .resolve_from(cli.job_args.iter().cloned())
        .context("Failed to resolve run configuration")?;

    print!("{}", output::render_runs(&runs, cli.format, cli.provenance)?);
    Ok(())
}
