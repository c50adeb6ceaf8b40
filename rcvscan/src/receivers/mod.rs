//! Broadcast receivers registered for sensitive intents, as reported by the
//! `Receiver Resolver Table` section of `dumpsys package`.

mod table;
pub use table::{Detection, ReceiverRecord, ReceiverTable};

mod parser;
pub use parser::parse_receiver_resolver_table;

mod matcher;
pub use matcher::{DumpsysReceivers, Finding, MatchMode};
