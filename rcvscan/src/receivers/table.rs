use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::Indicator;

/// Intent action -> receivers, in the order they appear in the dump
pub type ReceiverTable = IndexMap<String, Vec<ReceiverRecord>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverRecord {
    pub package: String,
    /// Full `package/class` component name
    pub receiver: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_indicator: Option<Indicator>,
}

impl ReceiverRecord {
    /// Builds a record from a `package/class` component name.
    ///
    /// Returns `None` unless there is a `/` preceded by a non-empty package.
    pub fn from_component(receiver: &str) -> Option<Self> {
        let (package, _) = receiver.split_once('/')?;
        if package.is_empty() {
            return None;
        }
        Some(Self {
            package: package.into(),
            receiver: receiver.into(),
            matched_indicator: None,
        })
    }
}

/// A receiver whose package matched an indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub intent: String,
    pub receiver: ReceiverRecord,
}

impl Detection {
    pub fn new(intent: String, receiver: ReceiverRecord) -> Self {
        Self { intent, receiver }
    }
}

// Serialized as `{"<intent>": {...}}`
impl Serialize for Detection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.intent, &self.receiver)?;
        map.end()
    }
}
