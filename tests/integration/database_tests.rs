//! Database integration tests
//!
//! These need a Postgres database with the records, communities, buckets
//! and PID tables. Run with: DATABASE_URL=... cargo test -- --ignored

use chrono::{TimeZone, Utc};
use record_migrator::{
    config::MigrationConfig,
    models::{MigrationOutcome, PidStatus, RECORD_SCHEMA},
    repository::Repository,
    services::migration::MigrationService,
    transform::FixedClock,
    AppError,
};
use serde_json::json;
use sqlx::{postgres::PgPoolOptions, types::Json, Pool, Postgres};
use std::sync::Arc;
use uuid::Uuid;

async fn pool() -> Pool<Postgres> {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("Failed to connect to database")
}

async fn insert_record(pool: &Pool<Postgres>, body: serde_json::Value) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO records_metadata (id, json, version_id, created, updated) VALUES ($1, $2, 1, now(), now())",
    )
    .bind(id)
    .bind(Json(body))
    .execute(pool)
    .await
    .expect("Failed to insert record");

    sqlx::query(
        "INSERT INTO pidstore_pid (pid_type, pid_value, status, object_type, object_uuid, created, updated) \
         VALUES ('recid', $1, 'R', 'rec', $2, now(), now())",
    )
    .bind(id.to_string())
    .bind(id)
    .execute(pool)
    .await
    .expect("Failed to insert PID");

    id
}

fn service(pool: Pool<Postgres>) -> MigrationService {
    MigrationService::new(Repository::new(pool), MigrationConfig::default()).with_clock(Arc::new(
        FixedClock(Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap()),
    ))
}

#[tokio::test]
#[ignore]
async fn test_migrate_record_in_database() {
    let pool = pool().await;
    let id = insert_record(
        &pool,
        json!({"upload_type": {"type": "dataset"}, "authors": [], "title": "db test"}),
    )
    .await;

    let outcome = service(pool.clone()).migrate(id).await.unwrap();
    assert!(matches!(outcome, MigrationOutcome::Migrated { .. }));

    let record = Repository::new(pool.clone()).records.get_by_id(id).await.unwrap();
    assert_eq!(record.json["$schema"], RECORD_SCHEMA);
    assert_eq!(record.version_id, 2);

    let again = service(pool).migrate(id).await.unwrap();
    assert_eq!(again, MigrationOutcome::AlreadyMigrated);
}

#[tokio::test]
#[ignore]
async fn test_failed_migration_reserves_pid() {
    let pool = pool().await;
    let id = insert_record(&pool, json!({"authors": [], "title": "no upload type"})).await;

    let err = service(pool.clone()).migrate(id).await.unwrap_err();
    assert!(matches!(err, AppError::Transform(_)));

    let repository = Repository::new(pool);
    let pid = repository.pids.get_by_object("recid", "rec", id).await.unwrap();
    assert_eq!(pid.status(), Some(PidStatus::Reserved));

    let record = repository.records.get_by_id(id).await.unwrap();
    assert!(!record.is_migrated());
}

#[tokio::test]
#[ignore]
async fn test_missing_record_is_skipped() {
    let pool = pool().await;
    let outcome = service(pool).migrate(Uuid::new_v4()).await.unwrap();
    assert_eq!(outcome, MigrationOutcome::Deleted);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_migrations_of_one_record() {
    let pool = pool().await;
    let id = insert_record(
        &pool,
        json!({"upload_type": "dataset", "authors": [], "title": "raced"}),
    )
    .await;

    let first = service(pool.clone());
    let second = service(pool.clone());
    let (a, b) = tokio::join!(first.migrate(id), second.migrate(id));

    let mut outcomes = vec![a.unwrap(), b.unwrap()];
    outcomes.retain(|o| *o != MigrationOutcome::AlreadyMigrated);
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0], MigrationOutcome::Migrated { .. }));

    let repository = Repository::new(pool);
    let record = repository.records.get_by_id(id).await.unwrap();
    assert_eq!(record.version_id, 2);
    let pid = repository.pids.get_by_object("recid", "rec", id).await.unwrap();
    assert_eq!(pid.status(), Some(PidStatus::Registered));
}
