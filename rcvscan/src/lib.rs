pub mod context;
pub use context::{Context, DefaultContext};

pub mod config;

pub mod errors;
pub use errors::{Error, Result};

pub mod adb;

pub mod command;
pub use command::run_cmd;

pub mod intent;
pub use intent::SensitiveIntent;

pub mod indicators;
pub use indicators::{Indicator, IndicatorLookup, Indicators};

pub mod receivers;
pub use receivers::{
    parse_receiver_resolver_table, Detection, DumpsysReceivers, Finding, MatchMode,
    ReceiverRecord, ReceiverTable,
};

pub mod output;

pub mod utils;

#[cfg(test)]
pub mod testing;
