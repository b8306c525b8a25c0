//! Building a `clap` command from the active registry options

use crate::options::{Arity, OptionRegistry, OptionSpec, ValueKind};
use clap::{Arg, ArgAction, Command};

pub(crate) const PROGRAM_NAME: &str = "diagconf";

/// One `clap` command accepting every active option of the registry.
///
/// Help and version flags are disabled so any flag string can be registered.
pub(crate) fn build_command(registry: &OptionRegistry) -> Command {
    let mut command = Command::new(PROGRAM_NAME)
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true);
    for spec in registry.active() {
        command = command.arg(to_arg(spec));
    }
    command
}

fn to_arg(spec: &OptionSpec) -> Arg {
    let mut arg = Arg::new(spec.dest.clone()).required(spec.required);

    let mut has_long = false;
    let mut has_short = false;
    for flag in spec.all_flags() {
        if let Some(long) = flag.strip_prefix("--") {
            arg = if has_long { arg.alias(long.to_string()) } else { arg.long(long.to_string()) };
            has_long = true;
        } else if let Some(short) = flag.strip_prefix('-').and_then(|s| s.chars().next()) {
            arg = if has_short { arg.short_alias(short) } else { arg.short(short) };
            has_short = true;
        }
    }

    if let Some(help) = &spec.help {
        arg = arg.help(help.clone());
    }
    if matches!(spec.kind, ValueKind::Int | ValueKind::Float) {
        arg = arg.allow_negative_numbers(true);
    }

    // Every occurrence is kept; single-valued options pick the last one afterwards.
    match spec.arity {
        Arity::Switch(_) => arg.action(ArgAction::SetTrue),
        Arity::Single | Arity::Append => arg.action(ArgAction::Append).num_args(1),
        Arity::Optional => arg.action(ArgAction::Append).num_args(0..=1),
        Arity::AtLeastOne => arg.action(ArgAction::Append).num_args(1..),
        Arity::Any => arg.action(ArgAction::Append).num_args(0..),
        Arity::Exactly(n) => arg.action(ArgAction::Append).num_args(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_contains_only_active_options() {
        let mut registry = OptionRegistry::with_baseline();
        registry.select_subset(["parameters"]).expect("subset");
        let command = build_command(&registry);
        let ids: Vec<&str> = command.get_arguments().map(|a| a.get_id().as_str()).collect();
        assert_eq!(ids, vec!["parameters"]);
    }

    #[test]
    fn command_is_internally_consistent() {
        build_command(&OptionRegistry::with_baseline()).debug_assert();
    }
}
