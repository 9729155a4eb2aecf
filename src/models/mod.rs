//! Data models for the record migrator

pub mod community;
pub mod legacy;
pub mod pid;
pub mod record;
pub mod report;

// Re-export commonly used types
pub use community::{Community, InclusionRequest};
pub use legacy::LegacyRecord;
pub use pid::{PersistentIdentifier, PidDump, PidStatus};
pub use record::{Document, Record, RECORD_SCHEMA, SCHEMA_KEY};
pub use report::{FailedMigration, MigrationOutcome, MigrationReport};
