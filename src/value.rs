//! Typed scalar values stored in a configuration document.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single configuration value.
///
/// The scalar kinds are the ones the wizard knows how to edit. Anything else
/// found in a file (floats, null, arrays, objects) is carried as `Opaque` and
/// copied through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    Opaque(serde_json::Value),
}

/// The kind of a [`Value`], used for type dispatch and prompt labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Integer,
    Boolean,
    Other,
}

impl ValueKind {
    /// Fixed-width label printed in front of each key.
    pub fn label(self) -> &'static str {
        match self {
            ValueKind::String => " String",
            ValueKind::Integer => "Integer",
            ValueKind::Boolean => "Boolean",
            ValueKind::Other => "  Other",
        }
    }
}

impl Value {
    /// Which editing rule applies to this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Str(_) => ValueKind::String,
            Value::Int(_) => ValueKind::Integer,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Opaque(_) => ValueKind::Other,
        }
    }

    /// The string, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The flag, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    /// Strings are shown bare, the way the operator typed them.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::Opaque(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Parses an integer the permissive way: leading whitespace is skipped, an
/// optional sign is accepted, and digits are consumed until the first
/// non-digit. Input with no leading digits yields 0. Out-of-range values
/// saturate.
pub fn parse_int_lenient(input: &str) -> i64 {
    parse_int_prefix(input).unwrap_or(0)
}

/// Like [`parse_int_lenient`] but reports whether any digits were found.
pub fn parse_int_prefix(input: &str) -> Option<i64> {
    let s = input.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits: &str = {
        let end = rest
            .bytes()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };
    if digits.is_empty() {
        return None;
    }

    let mut acc: i64 = 0;
    for b in digits.bytes() {
        let d = i64::from(b - b'0');
        acc = if negative {
            acc.saturating_mul(10).saturating_sub(d)
        } else {
            acc.saturating_mul(10).saturating_add(d)
        };
    }
    Some(acc)
}

/// Interprets operator input for a boolean key. `"true"` anywhere in the
/// input wins over `"false"`; anything else is `None`.
pub fn parse_bool_loose(input: &str) -> Option<bool> {
    if input.contains("true") {
        Some(true)
    } else if input.contains("false") {
        Some(false)
    } else {
        None
    }
}
