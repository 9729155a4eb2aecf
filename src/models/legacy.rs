//! Legacy record shape
//!
//! Only the keys the migration rewrites are split out. Everything else is
//! kept in `other` and passes through the pipeline untouched.
//!
//! A key that is present with a `null` value is still present: such fields
//! hold `Some(Value::Null)`, and only a missing key is `None`.

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

use super::record::Document;
use crate::error::{TransformError, TransformResult};

/// Legacy deposit owner
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyOwner {
    pub id: Option<Value>,
    pub email: Option<Value>,
    pub username: Option<Value>,
    pub deposition_id: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyGrant {
    pub identifier: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyOai {
    #[serde(default, deserialize_with = "present")]
    pub oai: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub indicator: Option<Value>,
}

/// Partial view of a legacy record document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyRecord {
    #[serde(default, deserialize_with = "present")]
    pub upload_type: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub authors: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub imprint: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub owner: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub conference_url: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub meetings: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub grants: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub references: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub oai: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub communities: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub provisional_communities: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Value>,
    #[serde(flatten)]
    pub other: Document,
}

impl LegacyRecord {
    pub fn from_document(doc: Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(doc))
    }
}

/// Keep `null` as a value instead of folding it into `None`
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Read the value of legacy field `name` into its expected shape
pub fn parse_field<T: DeserializeOwned>(name: &'static str, value: Value) -> TransformResult<T> {
    serde_json::from_value(value).map_err(|e| TransformError::malformed(name, e.to_string()))
}
