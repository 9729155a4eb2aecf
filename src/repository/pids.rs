//! Persistent identifiers repository

use sqlx::{
    postgres::{PgConnection, PgExecutor},
    Pool, Postgres,
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{PersistentIdentifier, PidStatus},
};

const PID_COLUMNS: &str = "id, pid_type, pid_value, pid_provider, status, object_type, object_uuid, created, updated";

#[derive(Clone)]
pub struct PidsRepository {
    pool: Pool<Postgres>,
}

impl PidsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*)::bigint FROM pidstore_pid")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn list_all(&self) -> AppResult<Vec<PersistentIdentifier>> {
        let pids = sqlx::query_as::<_, PersistentIdentifier>(&format!(
            "SELECT {} FROM pidstore_pid ORDER BY id",
            PID_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(pids)
    }

    /// Find the PID of the given type assigned to an object
    pub async fn get_by_object(
        &self,
        pid_type: &str,
        object_type: &str,
        object_uuid: Uuid,
    ) -> AppResult<PersistentIdentifier> {
        get_by_object(&self.pool, pid_type, object_type, object_uuid).await
    }
}

pub(crate) async fn get_by_object<'e>(
    executor: impl PgExecutor<'e>,
    pid_type: &str,
    object_type: &str,
    object_uuid: Uuid,
) -> AppResult<PersistentIdentifier> {
    sqlx::query_as::<_, PersistentIdentifier>(&format!(
        "SELECT {} FROM pidstore_pid WHERE pid_type = $1 AND object_type = $2 AND object_uuid = $3",
        PID_COLUMNS
    ))
    .bind(pid_type)
    .bind(object_type)
    .bind(object_uuid)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| {
        AppError::NotFound(format!(
            "No {} PID for {} object {}",
            pid_type, object_type, object_uuid
        ))
    })
}

pub(crate) async fn set_status(conn: &mut PgConnection, id: i32, status: PidStatus) -> AppResult<()> {
    sqlx::query("UPDATE pidstore_pid SET status = $1, updated = (now() AT TIME ZONE 'utc') WHERE id = $2")
        .bind(status.code())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
