use std::fmt::{self, Display, Formatter};
use std::result;

#[derive(Debug, PartialEq)]
pub enum Error {
    UnknownAlgorithm(String),
    InvalidHeaderSyntax(String),
    InvalidConfig(String),
    BadHtdigestLine(usize, String),
    Io(String),
}

pub type Result<T> = result::Result<T, Error>;

use Error::*;

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UnknownAlgorithm(ctx) => write!(f, "Unknown algorithm: {}", ctx),
            InvalidHeaderSyntax(ctx) => write!(f, "Invalid header syntax: {}", ctx),
            InvalidConfig(ctx) => write!(f, "Invalid configuration: {}", ctx),
            BadHtdigestLine(line, ctx) => write!(f, "Bad htdigest entry on line {}: {}", line, ctx),
            Io(ctx) => write!(f, "I/O error: {}", ctx),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Io(e.to_string())
    }
}

impl std::error::Error for Error {}
