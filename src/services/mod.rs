//! Business logic services

pub mod migration;
pub mod pids;

use crate::{config::MigrationConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub migration: migration::MigrationService,
    pub pids: pids::PidDumpService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, migration_config: MigrationConfig) -> Self {
        Self {
            migration: migration::MigrationService::new(repository.clone(), migration_config),
            pids: pids::PidDumpService::new(repository),
        }
    }
}
