//! Record migrator
//!
//! Migrates legacy bibliographic record JSON to the record-v1.0.0 schema and
//! performs the database bookkeeping that goes with it: community inclusion
//! requests, record/bucket links and PID reservation on failure.

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod transform;

pub use config::AppConfig;
pub use error::{AppError, AppResult, TransformError};
pub use transform::{transform_record, transform_value};
