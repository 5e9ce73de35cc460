use serde_json::{Map, Value};

use crate::{
    errno::errno_message,
    error::{PanError, Result},
    types::int_of,
};

/// Generic response envelope returned by every API call
///
/// Endpoints nest their payloads under different keys (`list`, `info`),
/// so the body is kept as a key-ordered map and read structurally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiResponse {
    body: Map<String, Value>,
}

/// Result of looking up an array payload in the envelope
#[derive(Debug, PartialEq)]
pub enum Payload<'a> {
    /// Key missing or null: nothing (more) to list
    Absent,
    Items(&'a [Value]),
}

impl ApiResponse {
    /// Decode a raw response body without losing numeric precision
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body).map_err(|e| PanError::Decode {
            message: e.to_string(),
        })?;
        match value {
            Value::Object(body) => Ok(Self { body }),
            other => Err(PanError::UnexpectedShape {
                field: "<root>".to_string(),
                found: kind_of(&other).to_string(),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Provider status code; a missing `errno` counts as success
    pub fn errno(&self) -> Result<i64> {
        match self.body.get("errno") {
            None | Some(Value::Null) => Ok(0),
            Some(value) => int_of(value).ok_or_else(|| PanError::UnexpectedShape {
                field: "errno".to_string(),
                found: kind_of(value).to_string(),
            }),
        }
    }

    pub fn errmsg(&self) -> Option<&str> {
        self.body.get("errmsg").and_then(Value::as_str)
    }

    /// Request id as its exact decimal text
    pub fn request_id(&self) -> Option<String> {
        match self.body.get("request_id")? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Turn a nonzero errno into a provider error
    ///
    /// The message is the response's own `errmsg` when present, otherwise
    /// the static errno table entry, otherwise empty.
    pub fn check_errno(&self) -> Result<()> {
        let errno = self.errno()?;
        if errno == 0 {
            return Ok(());
        }
        let message = self
            .errmsg()
            .map(String::from)
            .or_else(|| errno_message(errno).map(String::from))
            .unwrap_or_default();
        Err(PanError::Provider {
            errno,
            request_id: self.request_id(),
            message,
        })
    }

    /// Look up an array payload by key
    pub fn items(&self, key: &str) -> Result<Payload<'_>> {
        match self.body.get(key) {
            None | Some(Value::Null) => Ok(Payload::Absent),
            Some(Value::Array(items)) => Ok(Payload::Items(items.as_slice())),
            Some(other) => Err(PanError::UnexpectedShape {
                field: key.to_string(),
                found: kind_of(other).to_string(),
            }),
        }
    }

    /// OAuth endpoints report failures as `error` / `error_description`
    pub fn oauth_error(&self) -> Option<PanError> {
        let error = self.body.get("error")?.as_str()?;
        Some(PanError::OAuth {
            error: error.to_string(),
            description: self
                .body
                .get("error_description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }

    /// Read a string field, failing if it is missing
    pub fn required_str(&self, key: &str) -> Result<&str> {
        match self.body.get(key) {
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(other) => Err(PanError::UnexpectedShape {
                field: key.to_string(),
                found: kind_of(other).to_string(),
            }),
            None => Err(PanError::UnexpectedShape {
                field: key.to_string(),
                found: "nothing".to_string(),
            }),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errmsg_wins_over_table() {
        let res =
            ApiResponse::from_slice(br#"{"errno": -9, "errmsg": "gone", "request_id": 1}"#)
                .unwrap();
        match res.check_errno() {
            Err(PanError::Provider { errno, message, request_id }) => {
                assert_eq!(errno, -9);
                assert_eq!(message, "gone");
                assert_eq!(request_id.as_deref(), Some("1"));
            }
            other => panic!("Expected provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_errno_falls_back_to_table_then_empty() {
        let res = ApiResponse::from_slice(br#"{"errno": -9}"#).unwrap();
        match res.check_errno() {
            Err(PanError::Provider { message, .. }) => {
                assert_eq!(message, "file or directory does not exist")
            }
            other => panic!("Expected provider error, got {:?}", other),
        }

        let res = ApiResponse::from_slice(br#"{"errno": 424242}"#).unwrap();
        match res.check_errno() {
            Err(PanError::Provider { message, .. }) => assert!(message.is_empty()),
            other => panic!("Expected provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_request_id_keeps_precision() {
        let res =
            ApiResponse::from_slice(br#"{"errno": 0, "request_id": 8905413093476573185123}"#)
                .unwrap();
        assert_eq!(res.request_id().as_deref(), Some("8905413093476573185123"));
        assert!(res.check_errno().is_ok());
    }

    #[test]
    fn test_payload_shapes() {
        let res =
            ApiResponse::from_slice(br#"{"errno": 0, "list": [1, 2], "info": {"a": 1}}"#)
                .unwrap();
        assert!(matches!(res.items("list").unwrap(), Payload::Items(items) if items.len() == 2));
        assert_eq!(res.items("missing").unwrap(), Payload::Absent);
        assert!(matches!(res.items("info"), Err(PanError::UnexpectedShape { .. })));
    }

    #[test]
    fn test_oauth_error() {
        let res = ApiResponse::from_slice(
            br#"{"error": "invalid_grant", "error_description": "authorization code is invalid"}"#,
        )
        .unwrap();
        match res.oauth_error() {
            Some(PanError::OAuth { error, description }) => {
                assert_eq!(error, "invalid_grant");
                assert_eq!(description, "authorization code is invalid");
            }
            other => panic!("Expected OAuth error, got {:?}", other),
        }
        assert!(ApiResponse::default().oauth_error().is_none());
    }

    #[test]
    fn test_non_object_body_rejected() {
        assert!(matches!(
            ApiResponse::from_slice(b"[1, 2, 3]"),
            Err(PanError::UnexpectedShape { .. })
        ));
        assert!(matches!(
            ApiResponse::from_slice(b"<html>"),
            Err(PanError::Decode { .. })
        ));
    }
}
