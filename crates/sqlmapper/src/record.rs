//! Partial entity payloads.
//!
//! A [`Record`] maps property names to JSON values. It stands in for "an entity
//! with some fields set": a property is *set* when present and not `null`.
//! Any `serde::Serialize` struct converts into a record, so `Option<T>` fields
//! left as `None` simply drop out of the generated statement.

use crate::error::{MapperError, MapperResult};
use serde::Serialize;
use serde_json::{Map, Value};

/// Property → value map for one entity payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a serializable entity into a record.
    ///
    /// The value must serialize to a JSON object.
    pub fn from_serialize<T: Serialize + ?Sized>(entity: &T) -> MapperResult<Self> {
        match serde_json::to_value(entity)? {
            Value::Object(values) => Ok(Self { values }),
            other => Err(MapperError::invalid_payload(format!(
                "entity must serialize to an object, got {}",
                kind_of(&other)
            ))),
        }
    }

    /// Set a property (builder style).
    pub fn with(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(property.into(), value.into());
        self
    }

    pub fn insert(&mut self, property: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(property.into(), value.into());
    }

    /// The property's value if it is set (present and not null).
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.values.get(property).filter(|v| !v.is_null())
    }

    pub fn is_set(&self, property: &str) -> bool {
        self.get(property).is_some()
    }

    /// True when no property is set.
    pub fn is_blank(&self) -> bool {
        self.values.values().all(Value::is_null)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
