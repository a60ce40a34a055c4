//! Packaging Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A packaging error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for packaging operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Per-asset problems are never errors: unusable assets are skipped.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Only `.xhtml`, `.html` and `.htm` files can be converted.
    #[display("not a convertible document: {}", _0.display())]
    Unsupported(#[error(not(source))] PathBuf),
    /// The HTML source could not be sanitized.
    #[display("could not sanitize {}", _0.display())]
    Sanitize(#[error(not(source))] PathBuf),
    #[display("could not read {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// Writing the in-memory zip container failed.
    #[display("could not write archive entry {_0}")]
    Archive(#[error(not(source))] String),
    /// A builtin template is missing from the binary.
    #[display("builtin template not found: {_0}")]
    Template(#[error(not(source))] &'static str),
}

