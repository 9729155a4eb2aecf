//! Record migration service
//!
//! A migration runs in two phases. Phase one transforms and persists the
//! record together with its inclusion requests and bucket links, and commits
//! once. If anything in phase one fails, phase two rolls it back and, as a
//! separate commit, reserves the record's PID. The original error is then
//! returned to the caller.

use std::{collections::BTreeSet, future::Future, sync::Arc};

use serde_json::Value;
use uuid::Uuid;

use crate::{
    config::MigrationConfig,
    error::{AppError, AppResult, TransformError},
    models::{MigrationOutcome, MigrationReport, Record},
    repository::{MigrationSession, Repository},
    transform::{transform_record, Clock, SystemClock},
};

#[derive(Clone)]
pub struct MigrationService {
    repository: Repository,
    config: MigrationConfig,
    clock: Arc<dyn Clock>,
}

impl MigrationService {
    pub fn new(repository: Repository, config: MigrationConfig) -> Self {
        Self {
            repository,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used to stamp `_oai.updated`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Migrate one record in its own transaction
    pub async fn migrate(&self, record_id: Uuid) -> AppResult<MigrationOutcome> {
        let mut session = self.repository.session();
        migrate_record(&mut session, self.clock.as_ref(), record_id).await
    }

    /// Migrate records one after another, collecting failures
    pub async fn migrate_many(&self, record_ids: &[Uuid]) -> MigrationReport {
        run_batch(record_ids, self.config.fail_fast, |id| self.migrate(id)).await
    }

    /// Migrate records that do not carry `$schema` yet
    pub async fn migrate_pending(&self, limit: Option<i64>) -> AppResult<MigrationReport> {
        let limit = limit.unwrap_or(self.config.batch_limit);
        let ids = self.repository.records.list_unmigrated(limit).await?;
        tracing::info!("Found {} record(s) to migrate", ids.len());
        Ok(self.migrate_many(&ids).await)
    }
}

/// Migrate a single record through the given session.
pub async fn migrate_record<S>(
    session: &mut S,
    clock: &dyn Clock,
    record_id: Uuid,
) -> AppResult<MigrationOutcome>
where
    S: MigrationSession + ?Sized,
{
    let record = match session.get_record(record_id).await {
        Ok(record) => record,
        Err(e) if e.is_not_found() => {
            tracing::info!(%record_id, "Deleted record - no migration required");
            return Ok(MigrationOutcome::Deleted);
        }
        Err(e) => return compensate(session, record_id, e).await,
    };

    if record.is_migrated() {
        tracing::info!(%record_id, "Record already migrated");
        return Ok(MigrationOutcome::AlreadyMigrated);
    }

    match apply(session, clock, record).await {
        Ok(outcome) => {
            tracing::debug!(%record_id, ?outcome, "Record migrated");
            Ok(outcome)
        }
        Err(e) => compensate(session, record_id, e).await,
    }
}

async fn apply<S>(session: &mut S, clock: &dyn Clock, mut record: Record) -> AppResult<MigrationOutcome>
where
    S: MigrationSession + ?Sized,
{
    record.json = transform_record(std::mem::take(&mut record.json), clock)?;
    session.save_record(&mut record).await?;

    let mut inclusion_requests = 0;
    if record.json.contains_key("provisional_communities") {
        for community_id in record.provisional_communities() {
            let Some(community) = session.get_community(&community_id).await? else {
                tracing::warn!(
                    record_id = %record.id,
                    "Community {} does not exist",
                    community_id
                );
                continue;
            };
            match session.create_inclusion_request(&community, &record).await {
                Ok(_) => inclusion_requests += 1,
                Err(e) if e.is_conflict() => {
                    tracing::warn!(record_id = %record.id, "Inclusion request exists: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
        record.json.remove("provisional_communities");
        session.save_record(&mut record).await?;
    }

    let buckets = bucket_ids(&record)?;
    for bucket_id in &buckets {
        session.link_bucket(record.id, *bucket_id).await?;
    }

    session.commit().await?;

    Ok(MigrationOutcome::Migrated {
        inclusion_requests,
        buckets: buckets.len(),
    })
}

/// Roll back, reserve the PID in a separate commit, and hand back `error`
async fn compensate<S>(session: &mut S, record_id: Uuid, error: AppError) -> AppResult<MigrationOutcome>
where
    S: MigrationSession + ?Sized,
{
    tracing::error!(%record_id, "Migration failed: {}", error);

    if let Err(e) = reserve(session, record_id).await {
        tracing::error!(%record_id, "Could not reserve PID after failed migration: {}", e);
    }
    Err(error)
}

async fn reserve<S>(session: &mut S, record_id: Uuid) -> AppResult<()>
where
    S: MigrationSession + ?Sized,
{
    session.rollback().await?;
    session.reserve_pid(record_id).await?;
    session.commit().await
}

fn bucket_ids(record: &Record) -> AppResult<BTreeSet<Uuid>> {
    record
        .file_buckets()
        .iter()
        .map(|bucket| match bucket {
            Value::String(s) => Uuid::parse_str(s).map_err(|e| {
                AppError::from(TransformError::malformed(
                    "files",
                    format!("invalid bucket id {}: {}", s, e),
                ))
            }),
            other => Err(AppError::from(TransformError::malformed(
                "files",
                format!("invalid bucket id {}", other),
            ))),
        })
        .collect()
}

/// Drive `migrate` over `record_ids` in order and aggregate the outcomes
pub async fn run_batch<F, Fut>(record_ids: &[Uuid], fail_fast: bool, mut migrate: F) -> MigrationReport
where
    F: FnMut(Uuid) -> Fut,
    Fut: Future<Output = AppResult<MigrationOutcome>>,
{
    let mut report = MigrationReport::default();
    for &record_id in record_ids {
        match migrate(record_id).await {
            Ok(outcome) => report.record(&outcome),
            Err(e) => {
                report.record_failure(record_id, &e);
                if fail_fast {
                    tracing::warn!("Stopping batch after failure of record {}", record_id);
                    break;
                }
            }
        }
    }
    tracing::info!(
        migrated = report.migrated,
        already_migrated = report.already_migrated,
        deleted = report.deleted,
        failed = report.failed.len(),
        "Batch finished"
    );
    report
}
