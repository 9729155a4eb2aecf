//! Individual pipeline steps
//!
//! Every step is a no-op when its legacy key is absent, except
//! `migrate_upload_type` and `migrate_authors` which treat it as fatal. A key
//! holding `null` counts as present.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use super::{clock::datetime_to_datestamp, Clock, RecordDraft};
use crate::{
    error::{TransformError, TransformResult},
    models::{
        legacy::{parse_field, LegacyGrant, LegacyOai, LegacyOwner},
        Document, RECORD_SCHEMA, SCHEMA_KEY,
    },
};

/// Obsolete deposit metadata dropped from every record
pub const LEGACY_KEYS: &[&str] = &[
    "fft",
    "files_to_upload",
    "collections",
    "preservation_score",
    "restriction",
    "url",
    "version_history",
    "documents",
    "creation_date",
    "modification_date",
    "system_control_number",
    "system_number",
];

/// Funder namespace for grant references
pub const GRANT_REF_PREFIX: &str = "http://dx.zenodo.org/grants/10.13039/501100000780::";

/// Keys of `imprint` carried over to `part_of`
const PART_OF_KEYS: [&str; 3] = ["publisher", "title", "year"];

pub fn remove_fields(draft: &mut RecordDraft, _clock: &dyn Clock) -> TransformResult<()> {
    for key in LEGACY_KEYS {
        draft.doc.remove(*key);
    }
    Ok(())
}

pub fn migrate_upload_type(draft: &mut RecordDraft, _clock: &dyn Clock) -> TransformResult<()> {
    let upload_type = draft
        .legacy
        .upload_type
        .take()
        .ok_or(TransformError::MissingField("upload_type"))?;
    draft.doc.insert("resource_type".to_string(), upload_type);
    Ok(())
}

pub fn migrate_authors(draft: &mut RecordDraft, _clock: &dyn Clock) -> TransformResult<()> {
    let authors = draft
        .legacy
        .authors
        .take()
        .ok_or(TransformError::MissingField("authors"))?;
    let mut creators: Vec<Document> = parse_field("authors", authors)?;

    for creator in &mut creators {
        let first = match creator.get("affiliation") {
            Some(Value::Array(affiliations)) => Some(
                affiliations
                    .first()
                    .cloned()
                    .ok_or_else(|| TransformError::malformed("authors", "empty affiliation list"))?,
            ),
            _ => None,
        };
        if let Some(affiliation) = first {
            creator.insert("affiliation".to_string(), affiliation);
        }
    }

    draft.doc.insert(
        "creators".to_string(),
        Value::Array(creators.into_iter().map(Value::Object).collect()),
    );
    Ok(())
}

pub fn migrate_oai(draft: &mut RecordDraft, clock: &dyn Clock) -> TransformResult<()> {
    let Some(oai) = draft.legacy.oai.take() else {
        return Ok(());
    };
    let oai: LegacyOai = parse_field("oai", oai)?;

    let id = oai
        .oai
        .ok_or_else(|| TransformError::malformed("oai", "missing 'oai' identifier"))?;
    let sets = match oai.indicator {
        None => json!([]),
        Some(Value::String(set)) => json!([set]),
        Some(sets) => sets,
    };

    draft.doc.insert(
        "_oai".to_string(),
        json!({
            "id": id,
            "sets": sets,
            "updated": datetime_to_datestamp(clock.now()),
        }),
    );
    Ok(())
}

pub fn migrate_grants(draft: &mut RecordDraft, _clock: &dyn Clock) -> TransformResult<()> {
    let Some(grants) = draft.legacy.grants.take() else {
        return Ok(());
    };
    let grants: Vec<LegacyGrant> = parse_field("grants", grants)?;

    let refs = grants
        .into_iter()
        .map(|grant| {
            let identifier = grant
                .identifier
                .ok_or_else(|| TransformError::malformed("grants", "grant without identifier"))?;
            Ok(json!({ "$ref": format!("{}{}", GRANT_REF_PREFIX, plain_string(&identifier)) }))
        })
        .collect::<TransformResult<Vec<_>>>()?;

    draft.doc.insert("grants".to_string(), Value::Array(refs));
    Ok(())
}

pub fn migrate_meetings(draft: &mut RecordDraft, _clock: &dyn Clock) -> TransformResult<()> {
    let meetings = draft.legacy.meetings.take();
    let Some(url) = draft.legacy.conference_url.take() else {
        if let Some(meetings) = meetings {
            draft.doc.insert("meetings".to_string(), meetings);
        }
        return Ok(());
    };

    let mut meetings = match meetings {
        None => Map::new(),
        Some(Value::Object(meetings)) => meetings,
        Some(_) => return Err(TransformError::malformed("meetings", "expected an object")),
    };
    meetings.insert("url".to_string(), url);
    draft.doc.insert("meetings".to_string(), Value::Object(meetings));
    Ok(())
}

pub fn migrate_owners(draft: &mut RecordDraft, _clock: &dyn Clock) -> TransformResult<()> {
    let Some(owner) = draft.legacy.owner.take() else {
        return Ok(());
    };
    let owner: LegacyOwner = parse_field("owner", owner)?;

    let owners = match owner.id.as_ref().filter(|id| is_truthy(id)) {
        Some(id) => vec![Value::from(coerce_user_id(id)?)],
        None => Vec::new(),
    };

    let mut agent = Map::new();
    agent.insert("role".to_string(), json!("uploader"));
    for (key, value) in [
        ("email", owner.email),
        ("username", owner.username),
        ("user_id", owner.id),
    ] {
        if let Some(value) = value.filter(|v| is_truthy(v)) {
            agent.insert(key.to_string(), value);
        }
    }

    draft.doc.insert("owners".to_string(), Value::Array(owners));
    draft.doc.insert(
        "_internal".to_string(),
        json!({
            "state": "published",
            "source": {
                "legacy_deposit_id": owner.deposition_id.unwrap_or(Value::Null),
                "agents": [agent],
            },
        }),
    );
    Ok(())
}

pub fn migrate_description(draft: &mut RecordDraft, _clock: &dyn Clock) -> TransformResult<()> {
    let description = draft
        .legacy
        .description
        .take()
        .unwrap_or_else(|| Value::String(String::new()));
    draft.doc.insert("description".to_string(), description);
    Ok(())
}

/// A string or list `imprint` has no named fields and yields an empty `part_of`.
pub fn migrate_imprint(draft: &mut RecordDraft, _clock: &dyn Clock) -> TransformResult<()> {
    let Some(imprint) = draft.legacy.imprint.take() else {
        return Ok(());
    };

    let mut part_of = Map::new();
    match imprint {
        Value::Object(mut imprint) => {
            for key in PART_OF_KEYS {
                let Some(value) = imprint.remove(key) else { continue };
                if part_of.insert(key.to_string(), value).is_some() {
                    return Err(TransformError::Collision {
                        field: "imprint",
                        key: key.to_string(),
                    });
                }
            }
        }
        Value::String(_) | Value::Array(_) => {}
        other => {
            return Err(TransformError::malformed(
                "imprint",
                format!("expected an object, got {}", other),
            ))
        }
    }

    draft.doc.insert("part_of".to_string(), Value::Object(part_of));
    Ok(())
}

pub fn migrate_references(draft: &mut RecordDraft, _clock: &dyn Clock) -> TransformResult<()> {
    let Some(references) = draft.legacy.references.take() else {
        return Ok(());
    };
    let references: Vec<Document> = parse_field("references", references)?;

    let references: Vec<Value> = references
        .into_iter()
        .filter_map(|mut reference| reference.remove("raw_reference"))
        .filter(is_truthy)
        .map(|raw| json!({ "raw_reference": raw }))
        .collect();

    draft.doc.insert("references".to_string(), Value::Array(references));
    Ok(())
}

/// An empty or `null` value is kept as it is.
pub fn migrate_communities(draft: &mut RecordDraft, _clock: &dyn Clock) -> TransformResult<()> {
    let Some(communities) = draft.legacy.communities.take() else {
        return Ok(());
    };

    let communities = if holds_ids(&communities) {
        Value::Array(distinct_ids("communities", communities)?)
    } else {
        communities
    };
    draft.doc.insert("communities".to_string(), communities);
    Ok(())
}

/// Runs after `migrate_communities`: confirmed communities are subtracted.
pub fn migrate_provisional_communities(
    draft: &mut RecordDraft,
    _clock: &dyn Clock,
) -> TransformResult<()> {
    let Some(provisional) = draft.legacy.provisional_communities.take() else {
        return Ok(());
    };
    if !holds_ids(&provisional) {
        return Ok(());
    }

    let remaining: Vec<Value> = {
        let confirmed = draft.doc.get("communities").and_then(Value::as_array);
        distinct_ids("provisional_communities", provisional)?
            .into_iter()
            .filter(|id| !confirmed.is_some_and(|confirmed| confirmed.contains(id)))
            .collect()
    };

    if !remaining.is_empty() {
        draft
            .doc
            .insert("provisional_communities".to_string(), Value::Array(remaining));
    }
    Ok(())
}

pub fn add_schema(draft: &mut RecordDraft, _clock: &dyn Clock) -> TransformResult<()> {
    draft
        .doc
        .insert(SCHEMA_KEY.to_string(), Value::String(RECORD_SCHEMA.to_string()));
    Ok(())
}

/// Python-style truthiness of a JSON value
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// A single id is a string, even an empty one
fn holds_ids(value: &Value) -> bool {
    value.is_string() || is_truthy(value)
}

/// Distinct ids of a string-or-list value, non-string ids first, then sorted
fn distinct_ids(field: &'static str, value: Value) -> TransformResult<Vec<Value>> {
    let ids = match value {
        Value::String(_) => vec![value],
        Value::Array(ids) => ids,
        other => {
            return Err(TransformError::malformed(
                field,
                format!("expected a string or a list, got {}", other),
            ))
        }
    };

    let mut distinct = BTreeMap::new();
    for id in ids {
        let key = match &id {
            Value::String(s) => (true, s.clone()),
            Value::Array(_) | Value::Object(_) => {
                return Err(TransformError::malformed(field, format!("unusable id {}", id)))
            }
            other => (false, other.to_string()),
        };
        distinct.entry(key).or_insert(id);
    }
    Ok(distinct.into_values().collect())
}

/// Render a scalar without JSON quoting
fn plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn coerce_user_id(value: &Value) -> TransformResult<i64> {
    let id = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    };
    id.ok_or_else(|| TransformError::malformed("owner", format!("user id {} is not an integer", value)))
}
