use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// An explicitly requested configuration file does not exist.
    #[display("configuration file not found: {}", _0.display())]
    Missing(#[error(not(source))] PathBuf),
    /// A source could not be parsed or has the wrong shape.
    #[display("failed to load configuration: {_0}")]
    Load(#[error(not(source))] String),
    /// The merged configuration is not usable.
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] String),
}
