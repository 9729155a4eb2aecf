//! Record migrator command line
//!
//! Migrates legacy records in place, or runs the transformation offline.

use std::{io::Read, path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use record_migrator::{
    config::{AppConfig, LoggingConfig},
    models::MigrationReport,
    repository::Repository,
    services::Services,
    transform::{transform_value, SystemClock},
};

#[derive(Parser)]
#[command(name = "record-migrator", version, about = "Migrate legacy records to the record-v1.0.0 schema")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Migrate the given records
    Migrate {
        #[arg(required = true)]
        record_ids: Vec<Uuid>,
    },
    /// Migrate records that have not been migrated yet
    MigratePending {
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Transform a legacy JSON document without touching the database
    Transform {
        /// Input file; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Print every persistent identifier as one JSON object per line
    DumpPids,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    match cli.command {
        Command::Transform { file } => {
            transform_file(file)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Migrate { record_ids } => {
            let services = connect(&config).await?;
            let report = services.migration.migrate_many(&record_ids).await;
            print_report(&report)
        }
        Command::MigratePending { limit } => {
            let services = connect(&config).await?;
            let report = services.migration.migrate_pending(limit).await?;
            print_report(&report)
        }
        Command::DumpPids => {
            let services = connect(&config).await?;
            for dump in services.pids.dump_all().await? {
                println!("{}", serde_json::to_string(&dump)?);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("record_migrator={},sqlx=warn", logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn connect(config: &AppConfig) -> anyhow::Result<Services> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    Ok(Services::new(Repository::new(pool), config.migration.clone()))
}

fn transform_file(file: Option<PathBuf>) -> anyhow::Result<()> {
    let input = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let legacy: serde_json::Value = serde_json::from_str(&input).context("Input is not valid JSON")?;
    let migrated = transform_value(legacy, &SystemClock)?;
    println!("{}", serde_json::to_string_pretty(&migrated)?);
    Ok(())
}

fn print_report(report: &MigrationReport) -> anyhow::Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(report)?);
    if report.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
