//! Value encoding for string-only backends.
//!
//! Everything is persisted as a string. Strings are stored verbatim,
//! numbers and booleans as their textual form, and everything else as
//! compact JSON. Reading reverses this with an explicit tagged step:
//! the stored text is parsed as JSON when it can be, and kept as a raw
//! string otherwise.

use serde::Serialize;
use serde_json::Value;

/// Encode a value into the string written to the backend.
///
/// Fails only when `value` cannot be represented as JSON (for example a
/// map with non-string keys).
pub fn encode<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    Ok(match serde_json::to_value(value)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

/// A decoded value awaiting validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    /// The stored text parsed as JSON.
    Structured(Value),
    /// The stored text was not JSON and is kept as-is.
    Raw(String),
}

impl Candidate {
    /// Whether the stored text parsed as JSON.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// The value handed to a schema.
    pub fn into_value(self) -> Value {
        match self {
            Self::Structured(value) => value,
            Self::Raw(s) => Value::String(s),
        }
    }
}

/// Decode stored text. Never fails; unparseable text becomes [`Candidate::Raw`].
pub fn decode(raw: String) -> Candidate {
    match serde_json::from_str(&raw) {
        Ok(value) => Candidate::Structured(value),
        Err(_) => Candidate::Raw(raw),
    }
}
