//! Option values and the resolved options namespace shared across a dispatch chain.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value type of a registered option. Selects both the parser used for
/// command-line values and the typed getter used against the config store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    #[serde(alias = "str")]
    String,
    Int,
    Float,
    #[serde(alias = "bool")]
    Boolean,
}

impl ValueKind {
    /// Suffix naming the config store getter for this kind: `""` for plain
    /// strings, `"int"`, `"float"` or `"boolean"`.
    pub fn type_suffix(self) -> &'static str {
        match self {
            ValueKind::String => "",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Boolean => "boolean",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Boolean => "boolean",
        }
    }
}

/// A single resolved option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<String>),
}

impl OptionValue {
    /// Whether this value can stand as a default for an option of `kind`.
    /// Integers are accepted for float options.
    pub fn conforms_to(&self, kind: ValueKind) -> bool {
        matches!(
            (self, kind),
            (OptionValue::Str(_), ValueKind::String)
                | (OptionValue::Int(_), ValueKind::Int)
                | (OptionValue::Int(_), ValueKind::Float)
                | (OptionValue::Float(_), ValueKind::Float)
                | (OptionValue::Bool(_), ValueKind::Boolean)
        )
    }

    /// Normalize a conforming value to the exact representation of `kind`.
    pub(crate) fn normalize(self, kind: ValueKind) -> Self {
        match (self, kind) {
            (OptionValue::Int(i), ValueKind::Float) => OptionValue::Float(i as f64),
            (value, _) => value,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Int(i) => write!(f, "{}", i),
            OptionValue::Float(x) => write!(f, "{}", x),
            OptionValue::Str(s) => f.write_str(s),
            OptionValue::List(items) => f.write_str(&items.join(" ")),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(value.into())
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(value: Vec<String>) -> Self {
        OptionValue::List(value)
    }
}

/// Namespace of final option values, keyed by `dest`.
///
/// One instance is owned by the caller of the root command and passed by
/// mutable reference down the whole parent to child chain. Writes are
/// last-writer-wins: when a child command registers a `dest` a parent already
/// resolved, the child's resolved value replaces the parent's. Commands may
/// rely on reading values inherited from their parents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedOptions {
    values: BTreeMap<String, OptionValue>,
}

impl ResolvedOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `dest`, returning the value it replaced.
    pub fn set(&mut self, dest: impl Into<String>, value: impl Into<OptionValue>) -> Option<OptionValue> {
        self.values.insert(dest.into(), value.into())
    }

    pub fn get(&self, dest: &str) -> Option<&OptionValue> {
        self.values.get(dest)
    }

    pub fn contains(&self, dest: &str) -> bool {
        self.values.contains_key(dest)
    }

    pub fn get_str(&self, dest: &str) -> Option<&str> {
        match self.values.get(dest) {
            Some(OptionValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_int(&self, dest: &str) -> Option<i64> {
        match self.values.get(dest) {
            Some(OptionValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_float(&self, dest: &str) -> Option<f64> {
        match self.values.get(dest) {
            Some(OptionValue::Float(x)) => Some(*x),
            Some(OptionValue::Int(i)) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn get_bool(&self, dest: &str) -> Option<bool> {
        match self.values.get(dest) {
            Some(OptionValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Values of a multi-valued positional. A single string reads as a
    /// one-element list.
    pub fn get_list(&self, dest: &str) -> Option<Vec<String>> {
        match self.values.get(dest) {
            Some(OptionValue::List(items)) => Some(items.clone()),
            Some(OptionValue::Str(s)) => Some(vec![s.clone()]),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
