//! Opaque cursor encoding
//!
//! A cursor is `base64(JSON({scope: [[attribute, value], ...]}))`, one pair
//! per ordering column. Encoding uses the standard padded alphabet; decoding
//! also accepts URL-safe unpadded input, since cursors often travel in
//! query strings.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::{Map, Value};

use crate::errors::{PlanError, PlanResult};

/// Decoded cursor: the scope it was issued for and its ordered tuple
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCursor {
    pub scope: String,
    pub tuple: Vec<(String, Value)>,
}

impl DecodedCursor {
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.tuple.iter().map(|(attr, _)| attr.as_str())
    }
}

/// Stateless cursor codec
pub struct CursorCodec;

impl CursorCodec {
    pub fn encode(scope: &str, tuple: &[(String, Value)]) -> String {
        let pairs: Vec<Value> = tuple
            .iter()
            .map(|(attr, value)| Value::Array(vec![Value::String(attr.clone()), value.clone()]))
            .collect();

        let mut body = Map::new();
        body.insert(scope.to_string(), Value::Array(pairs));
        STANDARD.encode(Value::Object(body).to_string())
    }

    pub fn decode(cursor: &str) -> PlanResult<DecodedCursor> {
        let bytes = STANDARD
            .decode(cursor)
            .or_else(|_| URL_SAFE_NO_PAD.decode(cursor))
            .map_err(|_| PlanError::malformed_cursor("not valid base64"))?;

        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|_| PlanError::malformed_cursor("not valid JSON"))?;

        let object = match body {
            Value::Object(object) if object.len() == 1 => object,
            _ => {
                return Err(PlanError::malformed_cursor(
                    "expected an object with exactly one scope",
                ))
            }
        };

        let (scope, pairs) = object
            .into_iter()
            .next()
            .ok_or_else(|| PlanError::malformed_cursor("missing scope"))?;

        let pairs = match pairs {
            Value::Array(pairs) if !pairs.is_empty() => pairs,
            _ => return Err(PlanError::malformed_cursor("expected a non-empty tuple")),
        };

        let mut tuple = Vec::with_capacity(pairs.len());
        for pair in pairs {
            match pair {
                Value::Array(mut items) if items.len() == 2 => {
                    let value = items.pop().unwrap_or(Value::Null);
                    match items.pop() {
                        Some(Value::String(attr)) => tuple.push((attr, value)),
                        _ => return Err(PlanError::malformed_cursor("attribute must be a string")),
                    }
                }
                _ => {
                    return Err(PlanError::malformed_cursor(
                        "expected [attribute, value] pairs",
                    ))
                }
            }
        }

        Ok(DecodedCursor { scope, tuple })
    }

    /// Decodes and checks the cursor was issued for `expected_scope`
    pub fn decode_scoped(cursor: &str, expected_scope: &str) -> PlanResult<DecodedCursor> {
        let decoded = Self::decode(cursor)?;
        if decoded.scope != expected_scope {
            return Err(PlanError::malformed_cursor(format!(
                "cursor belongs to '{}', expected '{}'",
                decoded.scope, expected_scope
            )));
        }
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tuple() -> Vec<(String, Value)> {
        vec![
            ("username".to_string(), json!("amalia943")),
            ("id".to_string(), json!(65)),
        ]
    }

    #[test]
    fn test_encoded_form() {
        let cursor = CursorCodec::encode("User", &tuple());
        let raw = STANDARD.decode(&cursor).unwrap();
        let body: Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(body, json!({"User": [["username", "amalia943"], ["id", 65]]}));
    }

    #[test]
    fn test_round_trip() {
        let cursor = CursorCodec::encode("User", &tuple());
        let decoded = CursorCodec::decode(&cursor).unwrap();
        assert_eq!(decoded.scope, "User");
        assert_eq!(decoded.tuple, tuple());
        assert_eq!(decoded.attributes().collect::<Vec<_>>(), vec!["username", "id"]);
    }

    #[test]
    fn test_accepts_url_safe_unpadded() {
        let body = json!({"User": [["id", 1]]}).to_string();
        let cursor = URL_SAFE_NO_PAD.encode(body);
        let decoded = CursorCodec::decode(&cursor).unwrap();
        assert_eq!(decoded.tuple, vec![("id".to_string(), json!(1))]);
    }

    #[test]
    fn test_malformed_inputs() {
        let cases = [
            "!!not base64!!".to_string(),
            STANDARD.encode("not json"),
            STANDARD.encode("[1, 2]"),
            STANDARD.encode(r#"{"a": [["id", 1]], "b": [["id", 2]]}"#),
            STANDARD.encode(r#"{"User": []}"#),
            STANDARD.encode(r#"{"User": [["id"]]}"#),
            STANDARD.encode(r#"{"User": [[1, 2]]}"#),
        ];
        for cursor in &cases {
            let err = CursorCodec::decode(cursor).unwrap_err();
            assert_eq!(err.code(), "SEEK_MALFORMED_CURSOR", "cursor {}", cursor);
        }
    }

    #[test]
    fn test_scope_mismatch_rejected() {
        let cursor = CursorCodec::encode("User.friends", &tuple());
        assert!(CursorCodec::decode_scoped(&cursor, "User.friends").is_ok());
        let err = CursorCodec::decode_scoped(&cursor, "User").unwrap_err();
        assert!(matches!(err, PlanError::MalformedCursor(_)));
    }
}
