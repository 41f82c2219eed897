use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("message catalog is invalid")]
    Messages,
    #[display("matcher executable is unavailable")]
    Matcher,
    #[display("input directory `{}` is invalid", _0.display())]
    Directory(#[error(not(source))] PathBuf),
    #[display("batch run failed")]
    Batch,
}
