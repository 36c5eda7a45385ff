//! Translation between the `{"fields": ...}` wire envelope and caller types.
//!
//! Payloads are serialized as-is under `fields`, so `T` must already have the
//! shape of a Firestore value map. Plain structs can be wrapped in
//! [`ValueMap`] to get that shape from the typed value model.

use super::models::{ArrayValue, Document, FieldsEnvelope, MapValue, Value, ValueType};
use super::FirestoreError;
use crate::core::FirestoreErrorResponse;
use bytes::Bytes;
use serde::de::{DeserializeOwned, Error as DeError};
use serde::ser::Error as SerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::map::Map;
use serde_json::Value as SerdeValue;
use std::collections::HashMap;

/// Serializes `fields` wrapped as `{"fields": <fields>}`.
pub fn encode_fields<T: Serialize>(fields: &T) -> Result<Bytes, FirestoreError> {
    let body = serde_json::to_vec(&FieldsEnvelope { fields }).map_err(FirestoreError::Encoding)?;
    Ok(Bytes::from(body))
}

/// Wraps a pre-built fragment as `{fields: <raw>}` without looking at it.
///
/// Nothing here checks that `raw` is balanced or even JSON; a malformed
/// fragment is sent as-is and the API's rejection comes back as
/// [`FirestoreError::Remote`]. The caller owns well-formedness.
pub fn encode_raw_fields_unchecked(raw: &str) -> Bytes {
    Bytes::from(format!("{{fields: {}}}", raw))
}

/// Decodes a single document envelope.
pub fn decode_document<T: DeserializeOwned>(body: &[u8]) -> Result<Document<T>, FirestoreError> {
    serde_json::from_slice(body).map_err(|source| FirestoreError::ParseFailed {
        data: String::from_utf8_lossy(body).into_owned(),
        source,
    })
}

/// Turns a status and body into either the expected `T` or a typed error.
///
/// A success status decodes `T`, and falls back to the error envelope before
/// giving up. Any other status decodes the error envelope. Bodies matching
/// neither shape become [`FirestoreError::ParseFailed`] carrying the raw text.
///
/// An error envelope is surfaced as [`FirestoreError::Remote`] even under a 2xx status.
pub fn decode_response<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, FirestoreError> {
    let success = (200..300).contains(&status);

    if success {
        match serde_json::from_slice::<T>(body) {
            Ok(value) => return Ok(value),
            Err(source) => {
                return Err(decode_error_envelope(body).unwrap_or_else(|| {
                    tracing::warn!(status, "response body did not match the expected shape");
                    FirestoreError::ParseFailed {
                        data: String::from_utf8_lossy(body).into_owned(),
                        source,
                    }
                }));
            }
        }
    }

    match serde_json::from_slice::<FirestoreErrorResponse>(body) {
        Ok(envelope) => {
            tracing::warn!(status, error = %envelope, "firestore returned an error");
            Err(FirestoreError::Remote(envelope))
        }
        Err(source) => {
            tracing::warn!(status, "error response body was not an error envelope");
            Err(FirestoreError::ParseFailed {
                data: String::from_utf8_lossy(body).into_owned(),
                source,
            })
        }
    }
}

fn decode_error_envelope(body: &[u8]) -> Option<FirestoreError> {
    serde_json::from_slice::<FirestoreErrorResponse>(body)
        .ok()
        .map(FirestoreError::Remote)
}

/// A plain serde value carried as Firestore's typed value map.
///
/// `ValueMap(User { name: "Alice".into(), age: 30 })` goes over the wire as
/// `{"name": {"stringValue": "Alice"}, "age": {"integerValue": "30"}}`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueMap<T>(pub T);

impl<T> ValueMap<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize> Serialize for ValueMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = to_value_map(&self.0).map_err(S::Error::custom)?;
        fields.serialize(serializer)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ValueMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = HashMap::<String, Value>::deserialize(deserializer)?;
        from_value_map(fields).map(ValueMap).map_err(D::Error::custom)
    }
}

/// Converts a serializable struct into a typed value map. Only objects can
/// become documents.
pub fn to_value_map<T: Serialize>(value: &T) -> Result<HashMap<String, Value>, FirestoreError> {
    match serde_json::to_value(value).map_err(FirestoreError::Encoding)? {
        SerdeValue::Object(map) => map
            .into_iter()
            .map(|(k, v)| Ok::<_, FirestoreError>((k, to_firestore_value(v)?)))
            .collect(),
        _ => Err(FirestoreError::Encoding(<serde_json::Error as SerError>::custom(
            "only objects can be stored as document fields",
        ))),
    }
}

/// Converts a typed value map back into `T`.
pub fn from_value_map<T: DeserializeOwned>(
    fields: HashMap<String, Value>,
) -> Result<T, FirestoreError> {
    let value = fields_to_serde_value(fields)?;
    let data = value.to_string();
    serde_json::from_value(value).map_err(|source| FirestoreError::ParseFailed { data, source })
}

fn fields_to_serde_value(fields: HashMap<String, Value>) -> Result<SerdeValue, FirestoreError> {
    let mut map = Map::new();
    for (key, value) in fields {
        map.insert(key, to_serde_value(value)?);
    }
    Ok(SerdeValue::Object(map))
}

fn to_serde_value(value: Value) -> Result<SerdeValue, FirestoreError> {
    Ok(match value.value_type {
        ValueType::StringValue(s) => SerdeValue::String(s),
        ValueType::IntegerValue(s) => {
            let i: i64 = s.parse().map_err(|e| FirestoreError::ParseFailed {
                data: s.clone(),
                source: <serde_json::Error as DeError>::custom(format!("invalid integerValue: {}", e)),
            })?;
            SerdeValue::Number(i.into())
        }
        ValueType::DoubleValue(d) => match serde_json::Number::from_f64(d) {
            Some(n) => SerdeValue::Number(n),
            // NaN and infinities have no JSON form
            None => {
                return Err(FirestoreError::ParseFailed {
                    data: d.to_string(),
                    source: <serde_json::Error as DeError>::custom("non-finite doubleValue"),
                })
            }
        },
        ValueType::BooleanValue(b) => SerdeValue::Bool(b),
        ValueType::MapValue(map_value) => fields_to_serde_value(map_value.fields)?,
        ValueType::ArrayValue(array_value) => SerdeValue::Array(
            array_value
                .values
                .into_iter()
                .map(to_serde_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        ValueType::NullValue(_) => SerdeValue::Null,
        ValueType::TimestampValue(s) => SerdeValue::String(s),
        ValueType::GeoPointValue(gp) => {
            serde_json::json!({ "latitude": gp.latitude, "longitude": gp.longitude })
        }
        ValueType::BytesValue(s) => SerdeValue::String(s),
        ValueType::ReferenceValue(s) => SerdeValue::String(s),
    })
}

fn to_firestore_value(value: SerdeValue) -> Result<Value, FirestoreError> {
    let value_type = match value {
        SerdeValue::Null => ValueType::NullValue(()),
        SerdeValue::Bool(b) => ValueType::BooleanValue(b),
        SerdeValue::Number(n) => {
            match (n.as_i64(), n.as_f64().filter(|_| n.is_f64())) {
                (Some(i), _) => ValueType::IntegerValue(i.to_string()),
                (None, Some(f)) => ValueType::DoubleValue(f),
                // u64 above i64::MAX: integerValue is int64 and a double would lose digits
                (None, None) => {
                    return Err(FirestoreError::Encoding(<serde_json::Error as SerError>::custom(
                        format!("integer out of int64 range: {}", n),
                    )))
                }
            }
        }
        SerdeValue::String(s) => ValueType::StringValue(s),
        SerdeValue::Array(a) => ValueType::ArrayValue(ArrayValue {
            values: a
                .into_iter()
                .map(to_firestore_value)
                .collect::<Result<Vec<_>, _>>()?,
        }),
        SerdeValue::Object(o) => ValueType::MapValue(MapValue {
            fields: o
                .into_iter()
                .map(|(k, v)| Ok::<_, FirestoreError>((k, to_firestore_value(v)?)))
                .collect::<Result<HashMap<_, _>, FirestoreError>>()?,
        }),
    };
    Ok(Value { value_type })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
    struct User {
        name: String,
        age: i64,
        tags: Vec<String>,
    }

    fn alice() -> User {
        User {
            name: "Alice".to_string(),
            age: 30,
            tags: vec!["admin".to_string()],
        }
    }

    #[test]
    fn test_encode_wraps_payload_under_fields() {
        let body = encode_fields(&json!({ "title": { "stringValue": "hello" } })).unwrap();
        let parsed: SerdeValue = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed, json!({ "fields": { "title": { "stringValue": "hello" } } }));
    }

    #[test]
    fn test_encode_then_decode_returns_payload() {
        let body = encode_fields(&alice()).unwrap();
        let mut envelope: SerdeValue = serde_json::from_slice(&body).unwrap();
        envelope["name"] = json!("projects/p/databases/(default)/documents/users/alice");

        let doc: Document<User> = decode_document(envelope.to_string().as_bytes()).unwrap();
        assert_eq!(doc.fields, alice());
        assert_eq!(doc.id(), "alice");
    }

    #[test]
    fn test_raw_fragment_is_not_validated() {
        let body = encode_raw_fields_unchecked(r#"{"a": {"stringValue": "x"}"#);
        assert_eq!(&body[..], br#"{fields: {"a": {"stringValue": "x"}}"#);
    }

    #[test]
    fn test_decode_document_keeps_raw_text_on_mismatch() {
        let raw = br#"{"name": "x", "fields": {"name": 5}}"#;
        match decode_document::<User>(raw) {
            Err(FirestoreError::ParseFailed { data, .. }) => {
                assert_eq!(data.as_bytes(), raw);
            }
            other => panic!("expected ParseFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_response_error_envelope() {
        let body = json!({
            "error": { "code": 404, "message": "Document not found", "status": "NOT_FOUND" }
        })
        .to_string();

        match decode_response::<Document<User>>(404, body.as_bytes()) {
            Err(FirestoreError::Remote(envelope)) => assert_eq!(
                envelope,
                FirestoreErrorResponse::new(404, "Document not found", "NOT_FOUND")
            ),
            other => panic!("expected Remote, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_response_error_envelope_on_success_status() {
        let body = json!({
            "error": { "code": 400, "message": "bad", "status": "INVALID_ARGUMENT" }
        })
        .to_string();

        assert!(matches!(
            decode_response::<Document<User>>(200, body.as_bytes()),
            Err(FirestoreError::Remote(_))
        ));
    }

    #[test]
    fn test_decode_response_neither_shape() {
        let body = b"<html>Bad Gateway</html>";
        for status in [200, 502] {
            match decode_response::<Document<User>>(status, body) {
                Err(FirestoreError::ParseFailed { data, .. }) => {
                    assert_eq!(data, "<html>Bad Gateway</html>")
                }
                other => panic!("expected ParseFailed, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_value_map_wire_shape() {
        let wire = serde_json::to_value(ValueMap(alice())).unwrap();
        assert_eq!(
            wire,
            json!({
                "name": { "stringValue": "Alice" },
                "age": { "integerValue": "30" },
                "tags": { "arrayValue": { "values": [ { "stringValue": "admin" } ] } }
            })
        );

        let back: ValueMap<User> = serde_json::from_value(wire).unwrap();
        assert_eq!(back.into_inner(), alice());
    }

    #[test]
    fn test_value_map_inside_document() {
        let body = json!({
            "name": "projects/p/databases/(default)/documents/users/bob",
            "fields": {
                "name": { "stringValue": "Bob" },
                "age": { "integerValue": "41" },
                "tags": { "arrayValue": {} }
            },
            "createTime": "2021-01-01T00:00:00Z",
            "updateTime": "2021-01-02T00:00:00Z"
        })
        .to_string();

        let doc: Document<ValueMap<User>> = decode_document(body.as_bytes()).unwrap();
        assert_eq!(doc.fields.0.name, "Bob");
        assert_eq!(doc.fields.0.age, 41);
        assert!(doc.fields.0.tags.is_empty());
        assert!(doc.update_time > doc.create_time);
    }

    #[test]
    fn test_value_map_rejects_non_objects() {
        assert!(matches!(to_value_map(&42), Err(FirestoreError::Encoding(_))));
    }

    #[test]
    fn test_value_map_rejects_integers_beyond_int64() {
        #[derive(Serialize)]
        struct Counter {
            hits: u64,
        }

        let counter = Counter { hits: u64::MAX };
        assert!(matches!(to_value_map(&counter), Err(FirestoreError::Encoding(_))));
        assert!(serde_json::to_value(ValueMap(counter)).is_err());

        let fits = to_value_map(&Counter { hits: i64::MAX as u64 }).unwrap();
        assert_eq!(
            fits["hits"].value_type,
            ValueType::IntegerValue(i64::MAX.to_string())
        );
    }

    #[test]
    fn test_value_map_keeps_fractional_numbers_as_doubles() {
        let fields = to_value_map(&json!({ "ratio": 0.5 })).unwrap();
        assert_eq!(fields["ratio"].value_type, ValueType::DoubleValue(0.5));
    }

    #[test]
    fn test_non_finite_double_is_a_parse_failure() {
        for d in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut fields = HashMap::new();
            fields.insert(
                "ratio".to_string(),
                Value {
                    value_type: ValueType::DoubleValue(d),
                },
            );
            match from_value_map::<SerdeValue>(fields) {
                Err(FirestoreError::ParseFailed { data, .. }) => assert_eq!(data, d.to_string()),
                other => panic!("expected ParseFailed, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_document_without_fields_decodes_empty_payload() {
        #[derive(Deserialize, Debug, PartialEq, Default)]
        struct Profile {
            nickname: Option<String>,
        }

        let body = br#"{"name": "projects/p/databases/(default)/documents/users/empty"}"#;

        let doc: Document<SerdeValue> = decode_document(body).unwrap();
        assert_eq!(doc.fields, json!({}));
        assert_eq!(doc.id(), "empty");

        let doc: Document<ValueMap<Profile>> = decode_document(body).unwrap();
        assert_eq!(doc.fields.into_inner(), Profile::default());

        assert!(matches!(
            decode_document::<User>(body),
            Err(FirestoreError::ParseFailed { .. })
        ));
    }
}
