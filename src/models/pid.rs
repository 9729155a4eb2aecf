//! Persistent identifier model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// PID type used for record identifiers
pub const RECID_PID_TYPE: &str = "recid";

/// Object type of PIDs pointing at records
pub const RECORD_OBJECT_TYPE: &str = "rec";

/// PID lifecycle status, stored as a one-character code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PidStatus {
    New,
    Reserved,
    Registered,
    Redirected,
    Deleted,
}

impl PidStatus {
    pub fn code(self) -> &'static str {
        match self {
            PidStatus::New => "N",
            PidStatus::Reserved => "K",
            PidStatus::Registered => "R",
            PidStatus::Redirected => "M",
            PidStatus::Deleted => "D",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "N" => Some(PidStatus::New),
            "K" => Some(PidStatus::Reserved),
            "R" => Some(PidStatus::Registered),
            "M" => Some(PidStatus::Redirected),
            "D" => Some(PidStatus::Deleted),
            _ => None,
        }
    }
}

impl std::fmt::Display for PidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Row of `pidstore_pid`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PersistentIdentifier {
    pub id: i32,
    pub pid_type: String,
    pub pid_value: String,
    pub pid_provider: Option<String>,
    /// Raw status code, see [`PidStatus`]
    pub status: String,
    pub object_type: Option<String>,
    pub object_uuid: Option<Uuid>,
    pub created: Option<NaiveDateTime>,
    pub updated: Option<NaiveDateTime>,
}

impl PersistentIdentifier {
    pub fn status(&self) -> Option<PidStatus> {
        PidStatus::from_code(&self.status)
    }
}

/// Flat export of a PID row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PidDump {
    pub id: i32,
    pub pid_type: String,
    pub pid_value: String,
    pub pid_provider: Option<String>,
    pub status: String,
    pub object_type: Option<String>,
    pub object_value: Option<String>,
    /// ISO 8601, empty when unknown
    pub created: String,
    /// ISO 8601, empty when unknown
    pub last_modified: String,
}
