//! Transactional session used by the migration orchestrator

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use super::{buckets, communities, pids, records};
use crate::{
    error::AppResult,
    models::{
        pid::{RECID_PID_TYPE, RECORD_OBJECT_TYPE},
        Community, InclusionRequest, PidStatus, Record,
    },
};

/// Unit of work spanning a single record migration.
///
/// Operations join the open transaction, beginning one if needed. Nothing is
/// durable until `commit`; `rollback` discards everything since the last
/// commit.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MigrationSession: Send {
    /// Load the record and lock it for the rest of the transaction.
    /// Fails with `AppError::NotFound` when the record does not exist
    async fn get_record(&mut self, id: Uuid) -> AppResult<Record>;

    async fn save_record(&mut self, record: &mut Record) -> AppResult<()>;

    async fn get_community(&mut self, id: &str) -> AppResult<Option<Community>>;

    /// Fails with `AppError::Conflict` when the request already exists
    async fn create_inclusion_request(
        &mut self,
        community: &Community,
        record: &Record,
    ) -> AppResult<InclusionRequest>;

    async fn link_bucket(&mut self, record_id: Uuid, bucket_id: Uuid) -> AppResult<()>;

    /// Mark the record's PID as reserved so it cannot be reused
    async fn reserve_pid(&mut self, record_id: Uuid) -> AppResult<()>;

    async fn commit(&mut self) -> AppResult<()>;

    async fn rollback(&mut self) -> AppResult<()>;
}

/// Postgres session; dropping it with an open transaction rolls back
pub struct PgMigrationSession {
    pool: Pool<Postgres>,
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgMigrationSession {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool, tx: None }
    }

    async fn tx(&mut self) -> AppResult<&mut Transaction<'static, Postgres>> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => self.pool.begin().await?,
        };
        Ok(self.tx.insert(tx))
    }
}

#[async_trait]
impl MigrationSession for PgMigrationSession {
    async fn get_record(&mut self, id: Uuid) -> AppResult<Record> {
        let tx = self.tx().await?;
        records::fetch_for_update(&mut **tx, id).await
    }

    async fn save_record(&mut self, record: &mut Record) -> AppResult<()> {
        let tx = self.tx().await?;
        records::update_json(&mut **tx, record).await
    }

    async fn get_community(&mut self, id: &str) -> AppResult<Option<Community>> {
        let tx = self.tx().await?;
        communities::get(tx, id).await
    }

    async fn create_inclusion_request(
        &mut self,
        community: &Community,
        record: &Record,
    ) -> AppResult<InclusionRequest> {
        let tx = self.tx().await?;
        communities::create_inclusion_request(tx, community, record.id).await
    }

    async fn link_bucket(&mut self, record_id: Uuid, bucket_id: Uuid) -> AppResult<()> {
        let tx = self.tx().await?;
        buckets::link(tx, record_id, bucket_id).await
    }

    async fn reserve_pid(&mut self, record_id: Uuid) -> AppResult<()> {
        let tx = self.tx().await?;
        let pid = pids::get_by_object(&mut **tx, RECID_PID_TYPE, RECORD_OBJECT_TYPE, record_id).await?;
        pids::set_status(tx, pid.id, PidStatus::Reserved).await
    }

    async fn commit(&mut self) -> AppResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> AppResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}
