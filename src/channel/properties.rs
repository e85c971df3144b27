//! Open key-value map attached to every component configuration entry.
//!
//! Builders read it through typed accessors so that every missing or mistyped
//! field surfaces as a descriptive [`PropertyError`].

use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::PropertyError;

/// Kind-specific properties of one component.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, Value>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and programmatic configs.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A string that must be present.
    pub fn required_str(&self, key: &str) -> Result<&str, PropertyError> {
        self.optional_str(key)?.ok_or_else(|| PropertyError::Missing {
            key: key.to_string(),
        })
    }

    /// A string that may be absent (`null` counts as absent).
    pub fn optional_str(&self, key: &str) -> Result<Option<&str>, PropertyError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(PropertyError::Mistyped {
                key: key.to_string(),
                expected: "string",
            }),
        }
    }

    /// A non-negative integer number of milliseconds.
    pub fn optional_millis(&self, key: &str) -> Result<Option<Duration>, PropertyError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(|ms| Some(Duration::from_millis(ms)))
                .ok_or_else(|| PropertyError::Mistyped {
                    key: key.to_string(),
                    expected: "a non-negative integer",
                }),
            Some(_) => Err(PropertyError::Mistyped {
                key: key.to_string(),
                expected: "a non-negative integer",
            }),
        }
    }
}
