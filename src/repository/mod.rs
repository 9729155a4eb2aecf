//! Repository layer for database operations

pub mod buckets;
pub mod communities;
pub mod pids;
pub mod records;
pub mod session;

use sqlx::{Pool, Postgres};

pub use session::{MigrationSession, PgMigrationSession};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub records: records::RecordsRepository,
    pub pids: pids::PidsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            records: records::RecordsRepository::new(pool.clone()),
            pids: pids::PidsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Open a fresh unit of work; the transaction begins on first use
    pub fn session(&self) -> PgMigrationSession {
        PgMigrationSession::new(self.pool.clone())
    }
}
