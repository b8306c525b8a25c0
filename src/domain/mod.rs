//! Core domain types shared by every stage of a resolution pass

pub mod parameters;
pub mod template;

pub use parameters::{Parameters, Source};
pub use template::{MapTemplate, NoDefaults, Template};
