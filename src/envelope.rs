//! Response envelopes
//!
//! The backend mixes two controller conventions: plain resource endpoints return
//! the payload as the body, `/admin/*` endpoints wrap it as
//! `{"success": true, "data": ...}`. Each endpoint family declares its
//! [`Envelope`] once and the HTTP adapter unwraps bodies through it, so no caller
//! has to guess the shape.

use serde_json::Value;

use crate::errors::{ClientError, ClientResult};

/// Shape of a response body for an endpoint family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Envelope {
    /// The body is the payload
    #[default]
    Bare,
    /// The payload sits under `data`, optionally next to a `success` flag
    Wrapped,
    /// Accept either shape: unwrap only when the body looks like an envelope
    Auto,
}

impl Envelope {
    /// Extracts the payload from `body`.
    pub fn unwrap(self, body: Value) -> ClientResult<Value> {
        match self {
            Envelope::Bare => Ok(body),
            Envelope::Wrapped => unwrap_wrapped(body),
            Envelope::Auto => {
                if looks_wrapped(&body) {
                    unwrap_wrapped(body)
                } else {
                    Ok(body)
                }
            }
        }
    }
}

fn looks_wrapped(body: &Value) -> bool {
    match body.as_object() {
        Some(map) => {
            map.contains_key("data")
                && map.keys().all(|k| matches!(k.as_str(), "success" | "data" | "message" | "error" | "meta"))
        }
        None => false,
    }
}

fn unwrap_wrapped(body: Value) -> ClientResult<Value> {
    let Value::Object(mut map) = body else {
        return Err(ClientError::Envelope(format!(
            "expected an object envelope, got {}",
            kind_of(&body)
        )));
    };

    if let Some(success) = map.get("success")
        && success.as_bool() == Some(false)
    {
        let reason = map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(Value::as_str)
            .unwrap_or("request reported failure")
            .to_string();
        return Err(ClientError::Envelope(reason));
    }

    match map.remove("data") {
        Some(data) => Ok(data),
        // `{success: true}` with no payload (e.g. a delete)
        None if map.contains_key("success") => Ok(Value::Null),
        None => Err(ClientError::Envelope("missing `data` field".to_string())),
    }
}

/// Picks a named array out of an object payload (`{content: [...], categories: [...]}`).
///
/// A payload that is already an array is returned as-is.
pub fn select_field(payload: Value, field: &str) -> ClientResult<Value> {
    match payload {
        Value::Array(_) => Ok(payload),
        Value::Object(mut map) => map
            .remove(field)
            .ok_or_else(|| ClientError::Envelope(format!("missing `{field}` field"))),
        other => Err(ClientError::Envelope(format!(
            "expected `{field}` inside an object, got {}",
            kind_of(&other)
        ))),
    }
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_bodies_pass_through() {
        let body = json!([{"id": 1}, {"id": 2}]);
        assert_eq!(Envelope::Bare.unwrap(body.clone()).unwrap(), body);
    }

    #[test]
    fn wrapped_bodies_are_unwrapped() {
        let body = json!({"success": true, "data": {"content": [{"id": 1}], "categories": ["hero"]}});
        let payload = Envelope::Wrapped.unwrap(body).unwrap();
        assert_eq!(
            select_field(payload, "content").unwrap(),
            json!([{"id": 1}])
        );
    }

    #[test]
    fn failed_envelope_surfaces_message() {
        let body = json!({"success": false, "message": "Not allowed"});
        assert_eq!(
            Envelope::Wrapped.unwrap(body),
            Err(ClientError::Envelope("Not allowed".to_string()))
        );
    }

    #[test]
    fn auto_only_unwraps_envelope_shapes() {
        let record = json!({"id": 4, "data": "raw", "title": "Leaky tap"});
        assert_eq!(Envelope::Auto.unwrap(record.clone()).unwrap(), record);

        let wrapped = json!({"success": true, "data": [1, 2]});
        assert_eq!(Envelope::Auto.unwrap(wrapped).unwrap(), json!([1, 2]));
    }

    #[test]
    fn success_without_data_is_null() {
        let body = json!({"success": true});
        assert_eq!(Envelope::Wrapped.unwrap(body).unwrap(), Value::Null);
    }
}
