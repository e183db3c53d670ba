//! Read-path validation.
//!
//! A [`Schema`] turns a decoded JSON value into a typed value or rejects it.
//! Stores only consult schemas when reading; a rejection makes the read
//! return the caller's fallback.
//!
//! # Example
//!
//! ```
//! use securestore_lib::schema::{Coerced, Schema, SchemaExt, Typed};
//! use serde_json::json;
//!
//! let port = Coerced::<u16>::new().refine(|p| *p >= 1024, "port must be unprivileged");
//! assert_eq!(port.validate(json!("8080")).unwrap(), 8080);
//! assert!(port.validate(json!(80)).is_err());
//!
//! assert!(Typed::<Vec<String>>::new().validate(json!(["a", "b"])).is_ok());
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::codec::{self, Candidate};

/// A value rejected by a schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed: {message}")]
pub struct ValidationError {
    /// Why the value was rejected
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Validates a decoded value and produces the typed result.
pub trait Schema {
    /// The validated type.
    type Output;

    /// Accept or reject `value`.
    fn validate(&self, value: Value) -> Result<Self::Output, ValidationError>;

    /// Accept or reject text as read from a backend.
    ///
    /// Decodes `raw` with [`codec::decode`] and validates the candidate.
    fn validate_stored(&self, raw: String) -> Result<Self::Output, ValidationError> {
        self.validate(codec::decode(raw).into_value())
    }
}

impl<S: Schema + ?Sized> Schema for &S {
    type Output = S::Output;

    fn validate(&self, value: Value) -> Result<Self::Output, ValidationError> {
        (**self).validate(value)
    }

    fn validate_stored(&self, raw: String) -> Result<Self::Output, ValidationError> {
        (**self).validate_stored(raw)
    }
}

/// Accepts values that deserialize into `T`.
pub struct Typed<T>(PhantomData<fn() -> T>);

impl<T> Typed<T> {
    /// Create the schema.
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Typed<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Typed<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Copy for Typed<T> {}

impl<T> fmt::Debug for Typed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Typed<{}>", std::any::type_name::<T>())
    }
}

impl<T: DeserializeOwned> Schema for Typed<T> {
    type Output = T;

    fn validate(&self, value: Value) -> Result<T, ValidationError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Like [`Typed`], but retries with the value's alternate textual form.
///
/// Stored text loses its original type: `"42"` may have been the string
/// `"42"` or the number `42`. `Coerced` accepts either reading. A scalar is
/// retried as its string form and a string as its JSON parse.
///
/// When reading from a backend the string form of a scalar is the stored
/// text itself, so `"1e5"` and `"1.50"` come back unchanged as strings.
pub struct Coerced<T>(PhantomData<fn() -> T>);

impl<T> Coerced<T> {
    /// Create the schema.
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Coerced<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Coerced<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Copy for Coerced<T> {}

impl<T> fmt::Debug for Coerced<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coerced<{}>", std::any::type_name::<T>())
    }
}

impl<T: DeserializeOwned> Schema for Coerced<T> {
    type Output = T;

    fn validate(&self, value: Value) -> Result<T, ValidationError> {
        let alternate = match &value {
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            Value::Null => Some(Value::String("null".to_string())),
            Value::String(s) => serde_json::from_str::<Value>(s).ok(),
            _ => None,
        };

        match serde_json::from_value(value) {
            Ok(v) => Ok(v),
            Err(first) => match alternate {
                Some(alt) => serde_json::from_value(alt).map_err(|_| first.into()),
                None => Err(first.into()),
            },
        }
    }

    fn validate_stored(&self, raw: String) -> Result<T, ValidationError> {
        match codec::decode(raw.clone()) {
            Candidate::Structured(value @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => {
                match serde_json::from_value(value) {
                    Ok(v) => Ok(v),
                    Err(first) => {
                        serde_json::from_value(Value::String(raw)).map_err(|_| first.into())
                    }
                }
            }
            candidate => self.validate(candidate.into_value()),
        }
    }
}

/// Accepts any JSON value unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyJson;

impl Schema for AnyJson {
    type Output = Value;

    fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        Ok(value)
    }
}

/// Schema backed by a closure. Build with [`from_fn`].
#[derive(Clone, Copy)]
pub struct FnSchema<F>(F);

impl<F> fmt::Debug for FnSchema<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnSchema")
    }
}

/// Wrap a validation closure as a schema.
pub fn from_fn<F, T>(f: F) -> FnSchema<F>
where
    F: Fn(Value) -> Result<T, ValidationError>,
{
    FnSchema(f)
}

impl<F, T> Schema for FnSchema<F>
where
    F: Fn(Value) -> Result<T, ValidationError>,
{
    type Output = T;

    fn validate(&self, value: Value) -> Result<T, ValidationError> {
        (self.0)(value)
    }
}

/// Adds a predicate on top of another schema. Build with [`SchemaExt::refine`].
#[derive(Clone)]
pub struct Refine<S, P> {
    inner: S,
    predicate: P,
    message: String,
}

impl<S: fmt::Debug, P> fmt::Debug for Refine<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refine")
            .field("inner", &self.inner)
            .field("message", &self.message)
            .finish()
    }
}

impl<S, P> Schema for Refine<S, P>
where
    S: Schema,
    P: Fn(&S::Output) -> bool,
{
    type Output = S::Output;

    fn validate(&self, value: Value) -> Result<S::Output, ValidationError> {
        self.check(self.inner.validate(value)?)
    }

    fn validate_stored(&self, raw: String) -> Result<S::Output, ValidationError> {
        self.check(self.inner.validate_stored(raw)?)
    }
}

impl<S, P> Refine<S, P>
where
    S: Schema,
    P: Fn(&S::Output) -> bool,
{
    fn check(&self, out: S::Output) -> Result<S::Output, ValidationError> {
        if (self.predicate)(&out) {
            Ok(out)
        } else {
            Err(ValidationError::new(self.message.clone()))
        }
    }
}

/// Combinators for schemas.
pub trait SchemaExt: Schema + Sized {
    /// Reject validated values failing `predicate`.
    fn refine<P>(self, predicate: P, message: impl Into<String>) -> Refine<Self, P>
    where
        P: Fn(&Self::Output) -> bool,
    {
        Refine {
            inner: self,
            predicate,
            message: message.into(),
        }
    }
}

impl<S: Schema> SchemaExt for S {}
