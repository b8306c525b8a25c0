//! Error taxonomy for a resolution pass

use std::path::PathBuf;
use thiserror::Error;

/// Every way a resolution pass can fail.
///
/// All variants are raised at the point of detection and abort the pass.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("filename cannot contain '.' outside the extension: {}", .0.display())]
    Naming(PathBuf),

    #[error("unsupported parameter file format '{}': expected a .json or .cfg file", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("attribute '{name}' is listed in granulate but is not a sequence (got {found})")]
    NotIterable { name: String, found: &'static str },

    #[error("attribute '{0}' is listed in granulate but is not set")]
    MissingAttribute(String),

    #[error("invalid value '{value}' for {option}: expected {expected}")]
    InvalidValue { option: String, value: String, expected: String },

    #[error("type error: {0}")]
    Type(String),

    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("invalid option flag '{flag}': {reason}")]
    InvalidFlag { flag: String, reason: &'static str },

    #[error("{}:{line}: {message}", .path.display())]
    Syntax { path: PathBuf, line: usize, message: String },

    #[error("malformed {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("duplicate section '{section}' in {}", .path.display())]
    DuplicateSection { path: PathBuf, section: String },

    #[error("{0}")]
    Arguments(String),

    #[error("failed to generate salt: {0}")]
    Entropy(String),

    #[error("failed reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ResolveError>;

impl ResolveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json { path: path.into(), source }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Malformed { path: path.into(), reason: reason.into() }
    }

    /// True for the TypeError family: non-iterable granulate targets and failed conversions.
    pub fn is_type_error(&self) -> bool {
        matches!(self, Self::NotIterable { .. } | Self::InvalidValue { .. } | Self::Type(_))
    }
}

/// Read a file, mapping a missing path to [`ResolveError::NotFound`].
pub(crate) fn read_existing(path: &std::path::Path) -> Result<String> {
    if !path.is_file() {
        return Err(ResolveError::NotFound(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|e| ResolveError::io(path, e))
}
