//! Selective-update encoding: build PATCH bodies that only touch the fields a
//! caller actually set.
//!
//! A record is projected to a JSON object and compared key by key against the
//! projection of its type's zero value. Null values never survive. Nested
//! objects always survive, even when they look exactly like the zero
//! sub-object: a present sub-object is an explicit request. Any other value
//! survives only if it differs from the zero value at the same key.
//!
//! A consequence is that a scalar cannot be reset to its zero value through
//! this path. `downloads: 0`, `""`, `false` and `[]` are indistinguishable
//! from "unset" and are left out of the body.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ApiError, Result};

/// A typed resource synchronized with the API.
///
/// `zero` is the diffing baseline and must be deterministic. The default
/// implementation is the type's `Default`.
pub trait Record: Serialize + DeserializeOwned + Default {
    fn zero() -> Self {
        Self::default()
    }
}

/// Projects any serializable value to a JSON object.
pub fn to_object<T: Serialize + ?Sized>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ApiError::SerializationError(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
        Err(e) => Err(ApiError::SerializationError(e.to_string())),
    }
}

/// The minimal mapping that, applied to `T::zero()`, describes `record`.
pub fn diff_against_zero<T: Record>(record: &T) -> Result<Map<String, Value>> {
    let zero = to_object(&T::zero())?;
    let values = to_object(record)?;
    Ok(diff_objects(values, &zero))
}

fn diff_objects(values: Map<String, Value>, zero: &Map<String, Value>) -> Map<String, Value> {
    values
        .into_iter()
        .filter(|(key, value)| match value {
            Value::Null => false,
            Value::Object(_) => true,
            other => zero.get(key) != Some(other),
        })
        .collect()
}

/// Overlays an update mapping onto `T::zero()` and decodes the result.
pub fn apply_to_zero<T: Record>(update: &Map<String, Value>) -> Result<T> {
    let mut base = to_object(&T::zero())?;
    for (key, value) in update {
        base.insert(key.clone(), value.clone());
    }
    serde_json::from_value(Value::Object(base))
        .map_err(|e| ApiError::DeserializationError(e.to_string()))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
