//! Record model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// JSON body of a record
pub type Document = Map<String, Value>;

/// Schema URI stamped on every migrated record
pub const RECORD_SCHEMA: &str = "https://zenodo.org/schemas/records/record-v1.0.0.json";

/// Key whose presence marks a record as already migrated
pub const SCHEMA_KEY: &str = "$schema";

/// Row of `records_metadata`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub json: Document,
    pub version_id: i32,
    pub created: Option<NaiveDateTime>,
    pub updated: Option<NaiveDateTime>,
}

impl Record {
    pub fn new(id: Uuid, json: Document) -> Self {
        Self {
            id,
            json,
            version_id: 1,
            created: None,
            updated: None,
        }
    }

    pub fn is_migrated(&self) -> bool {
        self.json.contains_key(SCHEMA_KEY)
    }

    /// Provisional community ids, as left by the pipeline; non-string ids
    /// are rendered as JSON text
    pub fn provisional_communities(&self) -> Vec<String> {
        match self.json.get("provisional_communities") {
            Some(Value::Array(ids)) => ids.iter().map(community_id).collect(),
            Some(Value::String(id)) => vec![id.clone()],
            _ => Vec::new(),
        }
    }

    /// Distinct raw `bucket` values referenced by `files`
    pub fn file_buckets(&self) -> Vec<Value> {
        let mut buckets: Vec<Value> = Vec::new();
        let files = match self.json.get("files") {
            Some(Value::Array(files)) => files,
            _ => return buckets,
        };
        for file in files {
            let bucket = file.get("bucket").cloned().unwrap_or(Value::Null);
            if !buckets.contains(&bucket) {
                buckets.push(bucket);
            }
        }
        buckets
    }
}

fn community_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
