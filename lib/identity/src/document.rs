//! Loosely-typed user-info document returned by the identity provider.
//!
//! Field names are configuration-driven, so the document is kept as a
//! JSON object and read through required/optional accessors instead of a
//! fixed schema.

use serde_json::{Map, Value};

use crate::error::AuthenticationError;

/// A parsed user-info response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderDocument {
    fields: Map<String, Value>,
}

impl ProviderDocument {
    /// Parses a response body, which must be a JSON object.
    pub fn from_slice(body: &[u8]) -> Result<Self, AuthenticationError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| AuthenticationError::MalformedResponse {
                reason: e.to_string(),
                body: String::from_utf8_lossy(body).into_owned(),
            })?;

        Self::from_value(value).map_err(|e| match e {
            AuthenticationError::MalformedResponse { reason, .. } => {
                AuthenticationError::MalformedResponse {
                    reason,
                    body: String::from_utf8_lossy(body).into_owned(),
                }
            }
            other => other,
        })
    }

    /// Wraps an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, AuthenticationError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(AuthenticationError::MalformedResponse {
                reason: format!("expected a JSON object, found {}", kind(&other)),
                body: other.to_string(),
            }),
        }
    }

    /// Reads a scalar field as a string.
    ///
    /// Fails with `MissingField` if the field is absent or null, and with
    /// `ProfileResolutionFailed` if it holds an object or array. Numbers and
    /// booleans are rendered as text.
    pub fn required_str(&self, key: &str) -> Result<String, AuthenticationError> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Err(AuthenticationError::MissingField {
                field: key.to_string(),
            }),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(other) => Err(AuthenticationError::ProfileResolutionFailed {
                reason: format!("field '{key}' is {}, expected a string", kind(other)),
            }),
        }
    }

    /// Reads a scalar field as a string, returning `None` on any failure.
    #[must_use]
    pub fn optional_str(&self, key: &str) -> Option<String> {
        self.required_str(key).ok()
    }

    /// Reads an array field. Absent and null fields yield `None`.
    pub fn optional_array(&self, key: &str) -> Result<Option<&[Value]>, AuthenticationError> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items.as_slice())),
            Some(other) => Err(AuthenticationError::ProfileResolutionFailed {
                reason: format!("field '{key}' is {}, expected an array", kind(other)),
            }),
        }
    }

    /// Returns the underlying JSON object.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
