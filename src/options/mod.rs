//! Recognized command-line options and where their defaults come from

pub mod registry;
pub mod spec;
pub mod spec_file;

pub use registry::{
    OptionRegistry, GRANULATE_DEST, NUM_WORKERS_DEST, PRIMARY_DEST, SCHEDULER_DEST,
    SECONDARY_DEST,
};
pub use spec::{Arity, OptionSpec, ValueKind};
