//! Command-line surface

use crate::config::{
    DEFAULT_BUCKET, DEFAULT_LIBRARY_DIR, DEFAULT_QUEUE_CAPACITY, DEFAULT_REGION, DEFAULT_WORKERS,
};
use clap::Parser;

/// Make your gifwit library durable by uploading it to S3
#[derive(Parser, Debug)]
#[command(name = "durablewit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// gifwit directory holding the cached gifs and gifwit.storedata
    #[arg(short, long, env = "DURABLEWIT_DIR", default_value = DEFAULT_LIBRARY_DIR)]
    pub dir: String,

    /// Bucket to upload into; created if missing
    #[arg(short, long, env = "S3_BUCKET", default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// S3 region
    #[arg(short, long, env = "S3_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// Custom S3 endpoint, e.g. http://localhost:9000 for MinIO
    #[arg(long, env = "S3_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Use path-style bucket addressing (required by most S3 clones)
    #[arg(long, env = "S3_PATH_STYLE")]
    pub path_style: bool,

    /// Static access key; the default AWS credential chain is used otherwise
    #[arg(long, env = "S3_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Static secret key
    #[arg(long, env = "S3_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Concurrent fingerprint and upload workers
    #[arg(short, long, env = "DURABLEWIT_WORKERS", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Capacity of each queue between pipeline stages
    #[arg(long, env = "DURABLEWIT_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Do not create the bucket or touch its encryption settings
    #[arg(long)]
    pub skip_bucket_setup: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
