use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Error as DeError};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

pub use crate::core::{FirestoreErrorDetails, FirestoreErrorResponse};

/// A document as returned by the REST API, with its `fields` decoded into `T`.
///
/// The service omits `fields` for a document without any; `T` is then decoded
/// from an empty object.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document<T> {
    /// Full resource name, e.g. `projects/p/databases/(default)/documents/users/alice`.
    pub name: String,
    pub fields: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: Option<serde_json::Value>,
    #[serde(default)]
    create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    update_time: Option<DateTime<Utc>>,
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Document<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireDocument::deserialize(deserializer)?;
        let fields = wire
            .fields
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));
        Ok(Document {
            name: wire.name,
            fields: T::deserialize(fields).map_err(D::Error::custom)?,
            create_time: wire.create_time,
            update_time: wire.update_time,
        })
    }
}

impl<T> Document<T> {
    /// The last segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// One page of a `documents.list` call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: DeserializeOwned"))]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub documents: Vec<Document<T>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl<T> ListResponse<T> {
    /// The continuation token, with an empty string treated as absent.
    pub fn next_token(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Write envelope: `{"fields": <payload>}`.
#[derive(Serialize, Debug)]
pub(crate) struct FieldsEnvelope<'a, T> {
    pub(crate) fields: &'a T,
}

/// A single typed Firestore value, e.g. `{"stringValue": "Alice"}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Value {
    #[serde(flatten)]
    pub value_type: ValueType,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    StringValue(String),
    IntegerValue(String), // int64 travels as a decimal string
    DoubleValue(f64),
    BooleanValue(bool),
    MapValue(MapValue),
    ArrayValue(ArrayValue),
    NullValue(()),
    TimestampValue(String),
    GeoPointValue(GeoPoint),
    BytesValue(String), // base64
    ReferenceValue(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MapValue {
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}
