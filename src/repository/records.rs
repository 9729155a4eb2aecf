//! Records repository

use chrono::NaiveDateTime;
use sqlx::{postgres::PgExecutor, types::Json, FromRow, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Document, Record},
};

#[derive(FromRow)]
struct RecordRow {
    id: Uuid,
    json: Json<Document>,
    version_id: i32,
    created: Option<NaiveDateTime>,
    updated: Option<NaiveDateTime>,
}

impl From<RecordRow> for Record {
    fn from(row: RecordRow) -> Self {
        Record {
            id: row.id,
            json: row.json.0,
            version_id: row.version_id,
            created: row.created,
            updated: row.updated,
        }
    }
}

#[derive(Clone)]
pub struct RecordsRepository {
    pool: Pool<Postgres>,
}

impl RecordsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get record by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Record> {
        fetch(&self.pool, id).await
    }

    /// IDs of live records that have not been migrated yet
    pub async fn list_unmigrated(&self, limit: i64) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM records_metadata
            WHERE json IS NOT NULL AND json->'$schema' IS NULL
            ORDER BY created
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}

/// Load a live record; deleted records (NULL json) are not found
pub(crate) async fn fetch<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> AppResult<Record> {
    sqlx::query_as::<_, RecordRow>(
        r#"
        SELECT id, json, version_id, created, updated
        FROM records_metadata
        WHERE id = $1 AND json IS NOT NULL
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .map(Record::from)
    .ok_or_else(|| AppError::NotFound(format!("Record {} not found", id)))
}

/// Like [`fetch`], holding a row lock until the transaction ends so that
/// concurrent migrations of the same record run one after the other
pub(crate) async fn fetch_for_update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> AppResult<Record> {
    sqlx::query_as::<_, RecordRow>(
        r#"
        SELECT id, json, version_id, created, updated
        FROM records_metadata
        WHERE id = $1 AND json IS NOT NULL
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .map(Record::from)
    .ok_or_else(|| AppError::NotFound(format!("Record {} not found", id)))
}

/// Write the record body back, bumping its version
pub(crate) async fn update_json<'e>(
    executor: impl PgExecutor<'e>,
    record: &mut Record,
) -> AppResult<()> {
    let version_id = sqlx::query_scalar::<_, i32>(
        r#"
        UPDATE records_metadata
        SET json = $1, version_id = version_id + 1, updated = (now() AT TIME ZONE 'utc')
        WHERE id = $2
        RETURNING version_id
        "#,
    )
    .bind(Json(&record.json))
    .bind(record.id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Record {} not found", record.id)))?;

    record.version_id = version_id;
    Ok(())
}
