//! Community and inclusion request models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Row of `communities_community`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Community {
    pub id: String,
    pub id_user: Option<i32>,
    pub title: Option<String>,
    pub deleted_at: Option<NaiveDateTime>,
}

/// Pending request to include a record in a community
/// (row of `communities_community_record`)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct InclusionRequest {
    pub id_community: String,
    pub id_record: Uuid,
    pub id_user: Option<i32>,
    pub expires_at: Option<NaiveDateTime>,
    pub created: Option<NaiveDateTime>,
}
