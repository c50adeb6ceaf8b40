use clap::error::ErrorKind;
use std::fmt::Display;

mod file;
pub use file::ExistingFileValueParser;

pub fn simple_error(err: impl Display) -> clap::Error {
    clap::Error::raw(ErrorKind::InvalidValue, format!("{}\n", err.to_string()))
}
