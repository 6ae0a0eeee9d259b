//! Raw engine output and its validated forms.
//!
//! Engines hand back loosely-typed JSON. It is checked here, once, and turned into
//! either a [`RuleVerdict`] or a [`ShapeError`].

use serde_json::{Map, Value as JsonValue};

const KEY_NAME: &str = "name";
const KEY_VALID: &str = "valid";
const KEY_VIOLATION: &str = "violation";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawExpression {
    /// Absent when the engine only produced descriptive text.
    pub value: Option<JsonValue>,
    pub text: String,
}

impl RawExpression {
    pub fn with_value(value: JsonValue) -> Self {
        Self {
            value: Some(value),
            text: String::new(),
        }
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            value: None,
            text: text.into(),
        }
    }
}

/// One engine result: expressions plus the variable bindings that produced them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawResult {
    pub expressions: Vec<RawExpression>,
    pub bindings: Option<Map<String, JsonValue>>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("result has no expressions")]
    NoExpression,

    #[error("expression {text:?} has no value")]
    NoValue { text: String },

    #[error("result has no bindings")]
    NoBindings,

    #[error("bindings do not contain key \"name\"")]
    MissingName,

    #[error("binding \"name\" is {found} (expected string)")]
    NameNotString { found: &'static str },

    #[error("result value is {found} (expected object)")]
    NotAnObject { found: &'static str },

    #[error("result value does not contain key \"{key}\"")]
    MissingKey { key: &'static str },

    #[error("key \"{key}\" is {found} (expected {expected})")]
    WrongType {
        key: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("key \"{key}\" element {index} is {found} (expected string)")]
    NonStringElement {
        key: &'static str,
        index: usize,
        found: &'static str,
    },
}

/// A result that names the policy it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundOutcome {
    pub name: String,
    pub value: JsonValue,
}

impl RawResult {
    /// Take the first expression value and the `name` binding.
    pub fn bind(self) -> Result<BoundOutcome, ShapeError> {
        let expression = self
            .expressions
            .into_iter()
            .next()
            .ok_or(ShapeError::NoExpression)?;
        let value = expression.value.ok_or(ShapeError::NoValue {
            text: expression.text,
        })?;
        let bindings = self.bindings.ok_or(ShapeError::NoBindings)?;
        let name = match bindings.get(KEY_NAME) {
            None => return Err(ShapeError::MissingName),
            Some(JsonValue::String(name)) => name.clone(),
            Some(other) => {
                return Err(ShapeError::NameNotString {
                    found: json_type(other),
                });
            }
        };
        Ok(BoundOutcome { name, value })
    }
}

/// The validated verdict of one policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleVerdict {
    pub valid: bool,
    pub violations: Vec<String>,
}

impl RuleVerdict {
    /// `valid` is a required boolean; `violation` is an optional list of strings.
    pub fn from_value(value: &JsonValue) -> Result<Self, ShapeError> {
        let map = value.as_object().ok_or(ShapeError::NotAnObject {
            found: json_type(value),
        })?;
        Ok(Self {
            valid: bool_field(map, KEY_VALID)?,
            violations: string_list_field(map, KEY_VIOLATION)?.unwrap_or_default(),
        })
    }
}

fn bool_field(map: &Map<String, JsonValue>, key: &'static str) -> Result<bool, ShapeError> {
    match map.get(key) {
        None => Err(ShapeError::MissingKey { key }),
        Some(JsonValue::Bool(b)) => Ok(*b),
        Some(other) => Err(ShapeError::WrongType {
            key,
            expected: "boolean",
            found: json_type(other),
        }),
    }
}

fn string_list_field(
    map: &Map<String, JsonValue>,
    key: &'static str,
) -> Result<Option<Vec<String>>, ShapeError> {
    let Some(value) = map.get(key) else {
        return Ok(None);
    };
    let items = value.as_array().ok_or(ShapeError::WrongType {
        key,
        expected: "array",
        found: json_type(value),
    })?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            JsonValue::String(s) => Ok(s.clone()),
            other => Err(ShapeError::NonStringElement {
                key,
                index,
                found: json_type(other),
            }),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

pub(crate) fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
