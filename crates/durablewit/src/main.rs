//! durablewit - Main entry point

use clap::Parser;
use durablewit::cli::Cli;
use durablewit::config::MigrateConfig;
use durablewit::media::MagicSniffer;
use durablewit::pipeline::{self, MigrationSummary, PipelineContext};
use durablewit::storage::s3::S3ObjectStore;
use durablewit::store::SqliteRecordStore;
use durablewit::{PipelineError, Result};
use durablewit_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // .env is optional
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Info })
        .output(LogOutput::Console)
        .build();

    // Environment variables take precedence over flags
    let log_config = match log_config.clone().merge_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: ignoring logging environment: {e}");
            log_config
        },
    };

    // The migration works without logging, so a failed init is not fatal
    let _guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e:#}");
            None
        },
    };

    match migrate(&cli).await {
        Ok(summary) => {
            println!(
                "Migrated {} records ({} uploaded, {} reused); {} missing, {} failed, {} stale",
                summary.persisted,
                summary.uploaded,
                summary.reused,
                summary.missing,
                summary.failed,
                summary.stale,
            );
        },
        Err(e) => {
            let error = format!("{:#}", anyhow::Error::from(e));
            error!(%error, "Migration failed");
            eprintln!("Error: {}", error);
            process::exit(1);
        },
    }
}

async fn migrate(cli: &Cli) -> Result<MigrationSummary> {
    let config = MigrateConfig::from_cli(cli)?;
    let database = config.database_path();
    info!(database = %database.display(), bucket = %config.storage.bucket, "Opening library");

    let records = SqliteRecordStore::open(&database).await?;

    let objects = S3ObjectStore::new(config.storage.clone())
        .await
        .map_err(PipelineError::Storage)?;

    if config.bucket_setup {
        objects.ensure_bucket().await.map_err(PipelineError::Storage)?;
        objects
            .ensure_default_encryption()
            .await
            .map_err(PipelineError::Storage)?;
    }

    let records = Arc::new(records);
    let context = PipelineContext {
        records: records.clone(),
        objects: Arc::new(objects),
        sniffer: Arc::new(MagicSniffer),
    };

    let result = pipeline::run(context, config.pipeline_settings()).await;
    records.close().await;
    result
}
