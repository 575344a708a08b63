//! Caller-supplied values that may not have the expected shape.

use serde::Deserialize;

/// A typed field as sent by the caller.
///
/// A value of the wrong shape is kept as `Malformed` so validation can
/// report it against its field instead of rejecting the whole body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Submitted<T> {
    Parsed(T),
    Malformed(serde_json::Value),
}

impl<T> Submitted<T> {
    pub fn parsed(self) -> Option<T> {
        match self {
            Submitted::Parsed(value) => Some(value),
            Submitted::Malformed(_) => None,
        }
    }
}

impl<T> From<T> for Submitted<T> {
    fn from(value: T) -> Self {
        Submitted::Parsed(value)
    }
}
