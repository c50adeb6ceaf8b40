mod adb;
pub use adb::*;

mod context;
pub use context::*;

mod indicators;
pub use indicators::*;
