//! Command-line parsing with explicit-versus-default detection

mod command;
pub mod parser;

pub use parser::{CommandLine, ParsedArgs};
