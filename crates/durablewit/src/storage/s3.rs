//! S3 object store

use super::config::StorageConfig;
use super::{ObjectKey, ObjectStore, PutOptions};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{BehaviorVersion, Credentials, Region},
    error::ProvideErrorMetadata,
    primitives::ByteStream,
    types::{
        BucketLocationConstraint, CreateBucketConfiguration, ObjectCannedAcl,
        ServerSideEncryption, ServerSideEncryptionByDefault, ServerSideEncryptionConfiguration,
        ServerSideEncryptionRule,
    },
    Client,
};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Error code S3 answers `GetBucketEncryption` with when nothing is configured.
const NO_ENCRYPTION_CODE: &str = "ServerSideEncryptionConfigurationNotFoundError";

/// Region whose buckets must be created without a location constraint.
const DEFAULT_AWS_REGION: &str = "us-east-1";

#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    region: String,
    public_base: String,
}

impl S3ObjectStore {
    pub async fn new(config: StorageConfig) -> Result<Self> {
        debug!(
            region = %config.region,
            bucket = %config.bucket,
            endpoint = ?config.endpoint,
            "Initializing S3 client"
        );

        let mut builder = match config.static_credentials() {
            Some((access_key, secret_key)) => aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new(config.region.clone()))
                .credentials_provider(Credentials::new(
                    access_key,
                    secret_key,
                    None,
                    None,
                    "durablewit",
                )),
            None => {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(config.region.clone()))
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&shared)
            },
        };

        builder = builder.force_path_style(config.path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(builder.build());

        info!(bucket = %config.bucket, "S3 client initialized");

        Ok(Self {
            public_base: config.public_base_url(),
            client,
            bucket: config.bucket,
            region: config.region,
        })
    }

    /// Create the bucket unless this account already owns it.
    ///
    /// A bucket name taken by another account is fatal: nothing could be
    /// uploaded into it.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn ensure_bucket(&self) -> Result<()> {
        info!("Creating bucket");

        let mut request = self.client.create_bucket().bucket(&self.bucket);
        if self.region != DEFAULT_AWS_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                info!("Bucket created");
                Ok(())
            },
            Err(err) => {
                let err = err.into_service_error();
                if err.is_bucket_already_owned_by_you() {
                    info!("Bucket already exists");
                    Ok(())
                } else if err.is_bucket_already_exists() {
                    bail!("bucket {} already exists and belongs to another account", self.bucket)
                } else {
                    Err(anyhow!(err)).context(format!("Failed to create bucket {}", self.bucket))
                }
            },
        }
    }

    /// Apply default AES256 server-side encryption if the bucket has none.
    /// An existing configuration of any kind is left untouched.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn ensure_default_encryption(&self) -> Result<()> {
        debug!("Checking bucket for default encryption");

        let err = match self
            .client
            .get_bucket_encryption()
            .bucket(&self.bucket)
            .send()
            .await
        {
            Ok(_) => {
                info!("Bucket already has default encryption");
                return Ok(());
            },
            Err(err) => err.into_service_error(),
        };

        if err.code() != Some(NO_ENCRYPTION_CODE) {
            return Err(anyhow!(err))
                .context(format!("Failed to read encryption settings of {}", self.bucket));
        }

        info!("Bucket has no default encryption, applying AES256");

        let by_default = ServerSideEncryptionByDefault::builder()
            .sse_algorithm(ServerSideEncryption::Aes256)
            .build()
            .context("Failed to build encryption default")?;
        let configuration = ServerSideEncryptionConfiguration::builder()
            .rules(
                ServerSideEncryptionRule::builder()
                    .apply_server_side_encryption_by_default(by_default)
                    .build(),
            )
            .build()
            .context("Failed to build encryption configuration")?;

        self.client
            .put_bucket_encryption()
            .bucket(&self.bucket)
            .server_side_encryption_configuration(configuration)
            .send()
            .await
            .context(format!("Failed to enable default encryption on {}", self.bucket))?;

        info!("Default encryption applied");
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn store_id(&self) -> &str {
        &self.bucket
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn exists(&self, key: &ObjectKey) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                let err = err.into_service_error();
                if err.is_not_found() {
                    Ok(false)
                } else {
                    Err(anyhow!(err)).context(format!("Failed to check existence of {}", key))
                }
            },
        }
    }

    #[instrument(skip(self, options), fields(bucket = %self.bucket, content_type = options.content_type))]
    async fn put_object(&self, key: &ObjectKey, path: &Path, options: PutOptions<'_>) -> Result<String> {
        let body = ByteStream::from_path(path)
            .await
            .with_context(|| format!("Failed to open {} for upload", path.display()))?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .content_type(options.content_type)
            .body(body);

        if options.public_read {
            request = request.acl(ObjectCannedAcl::PublicRead);
        }

        request
            .send()
            .await
            .map_err(|e| anyhow!(e.into_service_error()))
            .context(format!("Failed to upload s3://{}/{}", self.bucket, key))?;

        let location = self.location_for(key);
        debug!(%location, "Object uploaded");
        Ok(location)
    }

    fn location_for(&self, key: &ObjectKey) -> String {
        format!("{}/{}", self.public_base, key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_location_for_aws() {
        let mut config = StorageConfig::new("us-west-2", "durablewit");
        config.access_key = Some("test".to_string());
        config.secret_key = Some("test".to_string());
        let store = S3ObjectStore::new(config).await.unwrap();

        let key = ObjectKey("abc123.gif".to_string());
        assert_eq!(
            store.location_for(&key),
            "https://s3-us-west-2.amazonaws.com/durablewit/abc123.gif"
        );
        assert_eq!(store.store_id(), "durablewit");
    }

    #[tokio::test]
    async fn test_location_for_custom_endpoint() {
        let store = S3ObjectStore::new(StorageConfig::for_minio("http://localhost:9000", "gifs"))
            .await
            .unwrap();

        let key = ObjectKey("abc123.png".to_string());
        assert_eq!(store.location_for(&key), "http://localhost:9000/gifs/abc123.png");
    }
}
