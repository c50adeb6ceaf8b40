use std::path::PathBuf;

use clap::builder::{NonEmptyStringValueParser, TypedValueParser};

use crate::parsers::simple_error;

/// Accepts a path only if it names an existing regular file
#[derive(Clone)]
pub struct ExistingFileValueParser;

impl TypedValueParser for ExistingFileValueParser {
    type Value = PathBuf;

    fn parse_ref(
        &self,
        cmd: &clap::Command,
        arg: Option<&clap::Arg>,
        value: &std::ffi::OsStr,
    ) -> Result<Self::Value, clap::Error> {
        let parser = NonEmptyStringValueParser::new();
        let val = parser.parse_ref(cmd, arg, value)?;
        let path = PathBuf::from(&val);

        if path.is_file() {
            Ok(path)
        } else if path.exists() {
            Err(simple_error(format!("{} is not a file", val)))
        } else {
            Err(simple_error(format!("{} doesn't exist", val)))
        }
    }
}
