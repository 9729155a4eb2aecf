//! Legacy record transformation
//!
//! A migration is a left fold of [`STEPS`] over a [`RecordDraft`]. Each step
//! moves one legacy field out of the typed [`LegacyRecord`] and writes its
//! new form into the output document.

pub mod clock;
pub mod steps;

use serde_json::Value;

use crate::{
    error::{TransformError, TransformResult},
    models::{Document, LegacyRecord, SCHEMA_KEY},
};

pub use clock::{datetime_to_datestamp, Clock, FixedClock, SystemClock};

/// Record being migrated: legacy fields not consumed yet, and the output
#[derive(Debug, Default)]
pub struct RecordDraft {
    pub legacy: LegacyRecord,
    pub doc: Document,
}

impl RecordDraft {
    pub fn new(doc: Document) -> TransformResult<Self> {
        let mut legacy = LegacyRecord::from_document(doc)
            .map_err(|e| TransformError::malformed("record", e.to_string()))?;
        let doc = std::mem::take(&mut legacy.other);
        Ok(Self { legacy, doc })
    }
}

/// A named, independently testable rewrite
pub struct Step {
    pub name: &'static str,
    pub apply: fn(&mut RecordDraft, &dyn Clock) -> TransformResult<()>,
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step").field("name", &self.name).finish()
    }
}

/// Order matters: communities before provisional communities, schema last.
pub const STEPS: &[Step] = &[
    Step { name: "remove_fields", apply: steps::remove_fields },
    Step { name: "migrate_upload_type", apply: steps::migrate_upload_type },
    Step { name: "migrate_authors", apply: steps::migrate_authors },
    Step { name: "migrate_oai", apply: steps::migrate_oai },
    Step { name: "migrate_grants", apply: steps::migrate_grants },
    Step { name: "migrate_meetings", apply: steps::migrate_meetings },
    Step { name: "migrate_owners", apply: steps::migrate_owners },
    Step { name: "migrate_description", apply: steps::migrate_description },
    Step { name: "migrate_imprint", apply: steps::migrate_imprint },
    Step { name: "migrate_references", apply: steps::migrate_references },
    Step { name: "migrate_communities", apply: steps::migrate_communities },
    Step {
        name: "migrate_provisional_communities",
        apply: steps::migrate_provisional_communities,
    },
    Step { name: "add_schema", apply: steps::add_schema },
];

/// Migrate a legacy record document.
///
/// Documents that already carry `$schema` are returned unchanged.
pub fn transform_record(doc: Document, clock: &dyn Clock) -> TransformResult<Document> {
    if doc.contains_key(SCHEMA_KEY) {
        return Ok(doc);
    }

    let draft = RecordDraft::new(doc)?;
    let draft = STEPS.iter().try_fold(draft, |mut draft, step| {
        tracing::trace!(step = step.name, "Applying transformation");
        (step.apply)(&mut draft, clock)?;
        Ok::<_, TransformError>(draft)
    })?;

    Ok(draft.doc)
}

/// Convenience wrapper for callers holding a `serde_json::Value`
pub fn transform_value(value: Value, clock: &dyn Clock) -> TransformResult<Value> {
    match value {
        Value::Object(doc) => transform_record(doc, clock).map(Value::Object),
        _ => Err(TransformError::malformed("record", "expected a JSON object")),
    }
}
