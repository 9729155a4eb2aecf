//! PID dump service
//!
//! Flat export of persistent identifiers for archival and reporting.

use chrono::{NaiveDateTime, Timelike};

use crate::{
    error::AppResult,
    models::{PersistentIdentifier, PidDump},
    repository::Repository,
};

#[derive(Clone)]
pub struct PidDumpService {
    repository: Repository,
}

impl PidDumpService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Count and load every PID
    pub async fn get(&self) -> AppResult<(i64, Vec<PersistentIdentifier>)> {
        let count = self.repository.pids.count().await?;
        let pids = self.repository.pids.list_all().await?;
        Ok((count, pids))
    }

    /// Load and dump every PID
    pub async fn dump_all(&self) -> AppResult<Vec<PidDump>> {
        let (count, pids) = self.get().await?;
        tracing::info!("Dumping {} persistent identifier(s)", count);
        Ok(pids.iter().map(dump).collect())
    }
}

/// Dump a PID as a flat record
pub fn dump(pid: &PersistentIdentifier) -> PidDump {
    PidDump {
        id: pid.id,
        pid_type: pid.pid_type.clone(),
        pid_value: pid.pid_value.clone(),
        pid_provider: pid.pid_provider.clone(),
        status: pid.status.trim().to_string(),
        object_type: pid.object_type.clone(),
        object_value: pid.object_uuid.map(|uuid| uuid.to_string()),
        created: iso_or_empty(pid.created),
        last_modified: iso_or_empty(pid.updated),
    }
}

/// ISO 8601 without offset; microseconds only when non-zero
fn iso_or_empty(dt: Option<NaiveDateTime>) -> String {
    match dt {
        None => String::new(),
        Some(dt) if dt.nanosecond() / 1_000 == 0 => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        Some(dt) => format!("{}.{:06}", dt.format("%Y-%m-%dT%H:%M:%S"), dt.nanosecond() / 1_000),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn pid(created: Option<NaiveDateTime>) -> PersistentIdentifier {
        PersistentIdentifier {
            id: 7,
            pid_type: "recid".to_string(),
            pid_value: "12345".to_string(),
            pid_provider: None,
            status: "R".to_string(),
            object_type: Some("rec".to_string()),
            object_uuid: Some(Uuid::nil()),
            created,
            updated: None,
        }
    }

    #[test]
    fn test_dump_formats_timestamps() {
        let created = NaiveDate::from_ymd_opt(2016, 3, 4)
            .unwrap()
            .and_hms_micro_opt(10, 11, 12, 250)
            .unwrap();
        let dumped = dump(&pid(Some(created)));

        assert_eq!(dumped.created, "2016-03-04T10:11:12.000250");
        assert_eq!(dumped.last_modified, "");
        assert_eq!(dumped.status, "R");
        assert_eq!(
            dumped.object_value.as_deref(),
            Some("00000000-0000-0000-0000-000000000000")
        );
    }

    #[test]
    fn test_dump_whole_seconds() {
        let created = NaiveDate::from_ymd_opt(2016, 3, 4)
            .unwrap()
            .and_hms_opt(10, 11, 12)
            .unwrap();
        assert_eq!(dump(&pid(Some(created))).created, "2016-03-04T10:11:12");
    }

    #[test]
    fn test_dump_serializes_flat() {
        let value = serde_json::to_value(dump(&pid(None))).unwrap();
        assert_eq!(value["pid_value"], "12345");
        assert_eq!(value["created"], "");
        assert_eq!(value["object_type"], "rec");
    }
}
