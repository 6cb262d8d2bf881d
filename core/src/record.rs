//! Records and table identity.

use crate::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An ordered map of field name to value: one row of a table.
pub type Record = BTreeMap<String, Value>;

/// Storage-assigned primary key.
pub type PrimaryKey = i64;

/// Opaque table identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(String);

impl TableId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TableId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TableId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Convert a record to a JSON object.
pub fn record_to_json(record: &Record) -> serde_json::Value {
    serde_json::Value::Object(
        record
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}

/// Convert a JSON object to a record. Returns `None` if `json` is not an object.
pub fn record_from_json(json: &serde_json::Value) -> Option<Record> {
    json.as_object().map(|obj| {
        obj.iter()
            .map(|(k, v)| (k.clone(), Value::from_json(v)))
            .collect()
    })
}

/// Helper macro to create records.
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        {
            let mut record = $crate::Record::new();
            $(
                record.insert($key.to_string(), $crate::Value::from($value));
            )+
            record
        }
    };
}
