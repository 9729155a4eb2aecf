//! Communities and inclusion requests

use sqlx::postgres::PgConnection;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Community, InclusionRequest},
};

/// Get a community; soft-deleted communities are treated as missing
pub(crate) async fn get(conn: &mut PgConnection, id: &str) -> AppResult<Option<Community>> {
    let community = sqlx::query_as::<_, Community>(
        r#"
        SELECT id, id_user, title, deleted_at
        FROM communities_community
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(community)
}

/// Create an inclusion request, failing with `Conflict` if one exists
///
/// The existence check runs first so a duplicate never aborts the
/// surrounding transaction.
pub(crate) async fn create_inclusion_request(
    conn: &mut PgConnection,
    community: &Community,
    record_id: Uuid,
) -> AppResult<InclusionRequest> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM communities_community_record
            WHERE id_community = $1 AND id_record = $2
        )
        "#,
    )
    .bind(&community.id)
    .bind(record_id)
    .fetch_one(&mut *conn)
    .await?;

    if exists {
        return Err(AppError::Conflict(format!(
            "Inclusion request for record {} in community {} already exists",
            record_id, community.id
        )));
    }

    let request = sqlx::query_as::<_, InclusionRequest>(
        r#"
        INSERT INTO communities_community_record (id_community, id_record, id_user, expires_at, created, updated)
        VALUES ($1, $2, NULL, NULL, (now() AT TIME ZONE 'utc'), (now() AT TIME ZONE 'utc'))
        RETURNING id_community, id_record, id_user, expires_at, created
        "#,
    )
    .bind(&community.id)
    .bind(record_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(request)
}
