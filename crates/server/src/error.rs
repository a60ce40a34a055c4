//! Server Error Types

use derive_more::{Display, Error};
use std::net::SocketAddr;
use std::path::PathBuf;

/// A server error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// "Not found" and "unauthorized" are ordinary dispatch outcomes, not errors.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The content root could not be created or opened.
    #[display("content root unavailable: {}", _0.display())]
    ContentRoot(#[error(not(source))] PathBuf),
    /// Sanitizing or packaging a document failed.
    #[display("conversion failed: {}", _0.display())]
    Conversion(#[error(not(source))] PathBuf),
    #[display("could not list directory {}", _0.display())]
    Listing(#[error(not(source))] PathBuf),
    /// The conversion worker panicked or was cancelled.
    #[display("conversion worker failed")]
    Worker,
    #[display("could not resolve listen address {_0}")]
    Address(#[error(not(source))] String),
    #[display(
        "could not load TLS certificate {} and key {} (`litepub gen-cert` creates a development pair)",
        cert.display(),
        key.display()
    )]
    Tls { cert: PathBuf, key: PathBuf },
    #[display("could not generate a self-signed certificate")]
    Certificate,
    #[display("could not write {}", _0.display())]
    WriteCertificate(#[error(not(source))] PathBuf),
    #[display("server on {_0} stopped unexpectedly")]
    Serve(#[error(not(source))] SocketAddr),
}

/// One-line description of an error and its first chain of causes, for
/// response bodies. The full tree (with locations) belongs in the log.
pub(crate) fn describe(frame: &exn::Frame) -> String {
    let mut parts = vec![frame.to_string()];
    let mut current = frame;
    while let Some(child) = current.children().first() {
        parts.push(child.to_string());
        current = child;
    }
    parts.join(": ")
}
