//! Configuration sources and how they are combined
//!
//! The primary parameter file (`-p`) binds shared attributes, secondary diag
//! files (`-d`) contribute one record per run, and [`Combiner`] folds them
//! together with the parsed command line in precedence order.

pub mod ini;
pub mod merge;
pub mod primary;
pub mod script;
pub mod secondary;

pub use merge::Combiner;
pub use primary::load_primary;
pub use secondary::{load_secondary, load_secondary_file, DiagFormat};
