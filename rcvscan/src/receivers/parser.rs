use std::mem;

use super::table::{ReceiverRecord, ReceiverTable};

const TABLE_MARKER: &'static str = "Receiver Resolver Table:";
const ACTIONS_MARKER: &'static str = "  Non-Data Actions:";
const HEADER_INDENT: &'static str = "      ";
const RECEIVER_INDENT: &'static str = "        ";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum ParseState {
    /// Looking for the `Receiver Resolver Table:` line
    #[default]
    Searching,
    /// Inside the table, looking for `  Non-Data Actions:`
    InTable,
    /// Inside the actions block with no open intent
    InActions,
    /// Collecting receivers for the named intent
    InIntent(String),
    /// Hit the blank line that ends the actions block
    Done,
}

struct TableParser {
    state: ParseState,
    table: ReceiverTable,
}

/// Parse the non-data actions of the `Receiver Resolver Table` out of the
/// output of `dumpsys package`.
///
/// Missing sections aren't an error, they just produce an empty table. A
/// receiver line that doesn't look like `<hash> <package>/<class> ...` fails
/// the whole parse with [crate::Error::MalformedReceiverLine].
pub fn parse_receiver_resolver_table(output: &str) -> crate::Result<ReceiverTable> {
    let mut parser = TableParser::new();

    for (idx, line) in output.split('\n').enumerate() {
        parser.feed(idx + 1, line)?;
        if parser.state == ParseState::Done {
            break;
        }
    }

    Ok(parser.finish())
}

impl TableParser {
    fn new() -> Self {
        Self {
            state: ParseState::Searching,
            table: ReceiverTable::new(),
        }
    }

    fn feed(&mut self, line_number: usize, line: &str) -> crate::Result<()> {
        let state = mem::take(&mut self.state);

        self.state = match state {
            ParseState::Done => ParseState::Done,

            ParseState::Searching if line.starts_with(TABLE_MARKER) => ParseState::InTable,
            ParseState::Searching => ParseState::Searching,

            ParseState::InTable if line.starts_with(ACTIONS_MARKER) => ParseState::InActions,
            ParseState::InTable => ParseState::InTable,

            // A blank line ends the non-data actions, nothing after it matters
            ParseState::InActions | ParseState::InIntent(_) if line.trim().is_empty() => {
                ParseState::Done
            }

            _ if is_intent_header(line) => {
                let intent = line.trim().replace(':', "");
                log::trace!("receiver table: intent {} at line {}", intent, line_number);
                // Repeated headers start over
                self.table.insert(intent.clone(), Vec::new());
                if intent.is_empty() {
                    // Receivers under a nameless header are dropped
                    ParseState::InActions
                } else {
                    ParseState::InIntent(intent)
                }
            }

            ParseState::InIntent(intent) if line.starts_with(RECEIVER_INDENT) => {
                let record = parse_receiver_line(line_number, line)?;
                self.table.entry(intent.clone()).or_default().push(record);
                ParseState::InIntent(intent)
            }

            // Anything less indented closes the block
            ParseState::InIntent(_) => ParseState::InActions,

            ParseState::InActions => ParseState::InActions,
        };

        Ok(())
    }

    fn finish(self) -> ReceiverTable {
        match self.state {
            ParseState::Searching => log::debug!("no receiver resolver table in output"),
            ParseState::InTable => log::debug!("receiver resolver table has no non-data actions"),
            _ => log::debug!(
                "receiver resolver table has {} intents",
                self.table.len()
            ),
        }
        self.table
    }
}

fn is_intent_header(line: &str) -> bool {
    line.starts_with(HEADER_INDENT) && !line.starts_with(RECEIVER_INDENT) && line.contains(':')
}

fn parse_receiver_line(line_number: usize, line: &str) -> crate::Result<ReceiverRecord> {
    let component = line.trim().split(' ').nth(1).unwrap_or("");

    match ReceiverRecord::from_component(component) {
        Some(record) => Ok(record),
        None => {
            log::warn!("malformed receiver line {}: {:?}", line_number, line);
            Err(crate::Error::MalformedReceiverLine {
                line_number,
                line: line.into(),
            })
        }
    }
}
