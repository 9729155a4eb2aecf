//! Record/bucket link rows

use sqlx::postgres::PgConnection;
use uuid::Uuid;

use crate::error::AppResult;

pub(crate) async fn link(conn: &mut PgConnection, record_id: Uuid, bucket_id: Uuid) -> AppResult<()> {
    sqlx::query("INSERT INTO records_buckets (record_id, bucket_id) VALUES ($1, $2)")
        .bind(record_id)
        .bind(bucket_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
