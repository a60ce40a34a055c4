use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("server failed")]
    Server,
    #[display("could not convert {}", _0.display())]
    Convert(#[error(not(source))] PathBuf),
    #[display("could not write {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
    #[display("could not generate a development certificate")]
    Certificate,
}
