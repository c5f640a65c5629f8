//! Nullable wrappers as the booking backend serializes optional SQL columns:
//! `{"Int32": 42, "Valid": true}` and `{"String": "0900000000", "Valid": true}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NullInt32 {
    #[serde(rename = "Int32", default)]
    pub int32: i32,
    #[serde(rename = "Valid", default)]
    pub valid: bool,
}

impl NullInt32 {
    pub fn valid(value: i32) -> Self {
        Self { int32: value, valid: true }
    }

    pub fn null() -> Self {
        Self::default()
    }

    /// The inner value, if the wrapper is marked valid
    pub fn get(&self) -> Option<i32> {
        self.valid.then_some(self.int32)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NullString {
    #[serde(rename = "String", default)]
    pub string: String,
    #[serde(rename = "Valid", default)]
    pub valid: bool,
}

impl NullString {
    pub fn valid(value: impl Into<String>) -> Self {
        Self { string: value.into(), valid: true }
    }

    pub fn get(&self) -> Option<&str> {
        self.valid.then_some(self.string.as_str())
    }
}
