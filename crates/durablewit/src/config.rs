//! Run configuration

use crate::cli::Cli;
use crate::error::{PipelineError, Result};
use crate::paths::expand_home;
use crate::pipeline::PipelineSettings;
use crate::storage::config::StorageConfig;
use std::path::PathBuf;

// ============================================================================
// Defaults
// ============================================================================

/// Where the gifwit Mac app keeps its cached images and database.
pub const DEFAULT_LIBRARY_DIR: &str =
    "~/Library/Containers/stevesmith.gifwit/Data/Library/Application Support/stevesmith.gifwitfiles/";

/// Database file inside the library directory.
pub const DATABASE_FILE_NAME: &str = "gifwit.storedata";

/// Default bucket; also what marks a record as already migrated.
pub const DEFAULT_BUCKET: &str = "durablewit";

pub const DEFAULT_REGION: &str = "us-west-2";

/// Fingerprint and upload pool width.
pub const DEFAULT_WORKERS: usize = 10;

/// Capacity of each inter-stage queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Everything one migration run needs
#[derive(Debug, Clone)]
pub struct MigrateConfig {
    /// Library directory with `~` already expanded
    pub library_dir: PathBuf,
    pub workers: usize,
    pub queue_capacity: usize,
    /// Create the bucket and enable default encryption before the run
    pub bucket_setup: bool,
    pub storage: StorageConfig,
}

impl MigrateConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = Self {
            library_dir: expand_home(&cli.dir)?,
            workers: cli.workers,
            queue_capacity: cli.queue_capacity,
            bucket_setup: !cli.skip_bucket_setup,
            storage: StorageConfig {
                endpoint: cli.endpoint.clone(),
                region: cli.region.clone(),
                bucket: cli.bucket.clone(),
                access_key: cli.access_key.clone(),
                secret_key: cli.secret_key.clone(),
                path_style: cli.path_style,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PipelineError::config("workers must be greater than 0"));
        }

        if self.queue_capacity == 0 {
            return Err(PipelineError::config("queue capacity must be greater than 0"));
        }

        // An empty bucket name would match every reference and exclude all records
        if self.storage.bucket.trim().is_empty() {
            return Err(PipelineError::config("bucket name cannot be empty"));
        }

        if self.storage.region.trim().is_empty() {
            return Err(PipelineError::config("region cannot be empty"));
        }

        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.library_dir.join(DATABASE_FILE_NAME)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            library_dir: self.library_dir.clone(),
            workers: self.workers,
            queue_capacity: self.queue_capacity,
        }
    }
}
