//! State values as a tagged union over JSON's shapes

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<StateValue>),
    Map(IndexMap<String, StateValue>),
}

impl StateValue {
    /// JavaScript truthiness: null, false, 0, NaN and "" are false
    pub fn is_truthy(&self) -> bool {
        match self {
            StateValue::Null => false,
            StateValue::Bool(b) => *b,
            StateValue::Number(n) => *n != 0.0 && !n.is_nan(),
            StateValue::String(s) => !s.is_empty(),
            StateValue::Array(_) | StateValue::Map(_) => true,
        }
    }

    pub fn as_array(&self) -> Option<&[StateValue]> {
        match self {
            StateValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            StateValue::Null => "null",
            StateValue::Bool(_) => "bool",
            StateValue::Number(_) => "number",
            StateValue::String(_) => "string",
            StateValue::Array(_) => "array",
            StateValue::Map(_) => "map",
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for StateValue {
    /// Renders the way a template literal would: `1` not `1.0`, arrays
    /// comma-joined.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Null => f.write_str("null"),
            StateValue::Bool(b) => write!(f, "{}", b),
            StateValue::Number(n) => write_number(f, *n),
            StateValue::String(s) => f.write_str(s),
            StateValue::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !matches!(item, StateValue::Null) {
                        write!(f, "{}", item)?;
                    }
                }
                Ok(())
            }
            StateValue::Map(_) => f.write_str("[object Object]"),
        }
    }
}

impl From<serde_json::Value> for StateValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => StateValue::Null,
            serde_json::Value::Bool(b) => StateValue::Bool(b),
            serde_json::Value::Number(n) => StateValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => StateValue::String(s),
            serde_json::Value::Array(items) => {
                StateValue::Array(items.into_iter().map(StateValue::from).collect())
            }
            serde_json::Value::Object(map) => StateValue::Map(
                map.into_iter()
                    .map(|(key, value)| (key, StateValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for StateValue {
    fn from(b: bool) -> Self {
        StateValue::Bool(b)
    }
}

impl From<f64> for StateValue {
    fn from(n: f64) -> Self {
        StateValue::Number(n)
    }
}

impl From<&str> for StateValue {
    fn from(s: &str) -> Self {
        StateValue::String(s.to_string())
    }
}

impl From<String> for StateValue {
    fn from(s: String) -> Self {
        StateValue::String(s)
    }
}

/// Root key → value map a render is evaluated against
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    values: IndexMap<String, StateValue>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.values.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut StateValue> {
        self.values.get_mut(key)
    }

    /// Value at `key`, inserting null when absent
    pub fn entry(&mut self, key: &str) -> &mut StateValue {
        self.values.entry(key.to_string()).or_default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<StateValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StateValue)> {
        self.values.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<serde_json::Value> for StateSnapshot {
    /// Non-object JSON yields an empty snapshot
    fn from(value: serde_json::Value) -> Self {
        match StateValue::from(value) {
            StateValue::Map(values) => Self { values },
            _ => Self::default(),
        }
    }
}
