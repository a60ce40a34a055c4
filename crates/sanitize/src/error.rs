//! Sanitizer Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A sanitizer error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for sanitizer operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Only `.html` and `.htm` sources are sanitized.
    #[display("not an HTML document: {}", _0.display())]
    Unsupported(#[error(not(source))] PathBuf),
    /// The source document vanished between resolution and conversion.
    #[display("source document not found: {}", _0.display())]
    SourceMissing(#[error(not(source))] PathBuf),
    #[display("could not read {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    #[display("could not write {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
    /// A builtin template is missing from the binary.
    #[display("builtin template not found: {_0}")]
    Template(#[error(not(source))] &'static str),
}

