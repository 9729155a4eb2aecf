//! Migration outcome and batch report models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to a single record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum MigrationOutcome {
    Migrated {
        inclusion_requests: usize,
        buckets: usize,
    },
    AlreadyMigrated,
    /// The record no longer exists
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailedMigration {
    pub record_id: Uuid,
    pub error: String,
}

/// Aggregated result of a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationReport {
    pub migrated: usize,
    pub already_migrated: usize,
    pub deleted: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<FailedMigration>,
}

impl MigrationReport {
    pub fn record(&mut self, outcome: &MigrationOutcome) {
        match outcome {
            MigrationOutcome::Migrated { .. } => self.migrated += 1,
            MigrationOutcome::AlreadyMigrated => self.already_migrated += 1,
            MigrationOutcome::Deleted => self.deleted += 1,
        }
    }

    pub fn record_failure(&mut self, record_id: Uuid, error: impl ToString) {
        self.failed.push(FailedMigration {
            record_id,
            error: error.to_string(),
        });
    }

    pub fn total(&self) -> usize {
        self.migrated + self.already_migrated + self.deleted + self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
