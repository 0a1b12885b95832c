//! S3-compatible provider using [`object_store::aws::AmazonS3Builder`].
//!
//! Works with AWS S3, MinIO, and any S3-compatible service. Settings not
//! given explicitly are read from the standard `AWS_*` environment variables.
//! The account-level bucket catalog, which [`object_store`] does not expose,
//! is read with the [`minio`] client.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use minio::s3::Client;
use minio::s3::creds::StaticProvider;
use minio::s3::http::BaseUrl;
use minio::s3::types::S3Api;
use object_store::aws::AmazonS3Builder;
use object_store::{ClientOptions, RetryConfig};
use serde::{Deserialize, Serialize};

use super::{StoreProvider, validate_bucket_name};
use crate::TRACING_TARGET_CLIENT;
use crate::client::ObjectStoreClient;
use crate::types::{BucketInfo, Error, Result};

// Default values
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_MAX_RETRIES: usize = 3;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 60;

/// Connection settings for an S3-compatible store.
///
/// Secrets are never serialized, so the configuration can be logged as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct S3Config {
    /// AWS region
    #[cfg_attr(
        feature = "config",
        arg(long = "aws-region", env = "AWS_REGION", default_value = DEFAULT_REGION)
    )]
    #[serde(default = "default_region")]
    pub region: String,

    /// Endpoint URL for S3-compatible services (e.g. `http://localhost:9000`)
    #[cfg_attr(feature = "config", arg(long = "s3-endpoint", env = "S3_ENDPOINT"))]
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Access key ID for static credentials
    #[cfg_attr(
        feature = "config",
        arg(long = "aws-access-key-id", env = "AWS_ACCESS_KEY_ID", hide_env_values = true)
    )]
    #[serde(default, skip_serializing)]
    pub access_key_id: Option<String>,

    /// Secret access key for static credentials
    #[cfg_attr(
        feature = "config",
        arg(
            long = "aws-secret-access-key",
            env = "AWS_SECRET_ACCESS_KEY",
            hide_env_values = true
        )
    )]
    #[serde(default, skip_serializing)]
    pub secret_access_key: Option<String>,

    /// Session token for temporary credentials
    #[cfg_attr(
        feature = "config",
        arg(long = "aws-session-token", env = "AWS_SESSION_TOKEN", hide_env_values = true)
    )]
    #[serde(default, skip_serializing)]
    pub session_token: Option<String>,

    /// Comma-separated list of buckets the engine may access
    #[cfg_attr(
        feature = "config",
        arg(long = "s3-buckets", env = "S3_BUCKETS", value_delimiter = ',')
    )]
    #[serde(default)]
    pub buckets: Vec<String>,

    /// Maximum retries for a failed request
    #[cfg_attr(
        feature = "config",
        arg(long = "s3-max-retries", env = "S3_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)
    )]
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Connection timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(
            long = "s3-connect-timeout",
            env = "S3_CONNECT_TIMEOUT_SECS",
            default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS
        )
    )]
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Per-request read timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(
            long = "s3-read-timeout",
            env = "S3_READ_TIMEOUT_SECS",
            default_value_t = DEFAULT_READ_TIMEOUT_SECS
        )
    )]
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_max_retries() -> usize {
    DEFAULT_MAX_RETRIES
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_read_timeout() -> u64 {
    DEFAULT_READ_TIMEOUT_SECS
}

impl Default for S3Config {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

impl S3Config {
    /// Create a configuration for `region` with default timeouts.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            buckets: Vec::new(),
            max_retries: DEFAULT_MAX_RETRIES,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }

    /// Set the bucket allowlist.
    #[must_use]
    pub fn with_buckets<I, S>(mut self, buckets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buckets = buckets.into_iter().map(Into::into).collect();
        self
    }

    /// Set a custom endpoint (MinIO, LocalStack, ...).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set static credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Returns the connection timeout as a Duration.
    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Returns the read timeout as a Duration.
    #[inline]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Returns the trimmed, deduplicated, sorted allowlist.
    pub fn allowlist(&self) -> BTreeSet<String> {
        self.buckets
            .iter()
            .map(|b| b.trim())
            .filter(|b| !b.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Validate the configuration and return any issues.
    pub fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            return Err(Error::invalid_request("AWS region cannot be empty"));
        }
        if let Some(endpoint) = &self.endpoint
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(Error::invalid_request(format!(
                "invalid S3 endpoint '{endpoint}': expected an http(s) URL"
            )));
        }
        if self.access_key_id.is_some() != self.secret_access_key.is_some() {
            return Err(Error::invalid_request(
                "AWS access key ID and secret access key must be set together",
            ));
        }
        for bucket in self.allowlist() {
            validate_bucket_name(&bucket)?;
        }
        Ok(())
    }
}

/// S3-backed provider with a bucket allowlist.
///
/// Bucket listing asks the store for its buckets and keeps the allowlisted
/// ones; an empty allowlist permits and lists every bucket.
pub struct S3Provider {
    config: S3Config,
    allowlist: BTreeSet<String>,
    clients: Mutex<HashMap<String, ObjectStoreClient>>,
}

impl S3Provider {
    pub const ID: &str = "s3";

    /// Create a provider from `config`.
    pub fn new(config: S3Config) -> Self {
        let allowlist = config.allowlist();
        Self {
            config,
            allowlist,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the configuration this provider was built from.
    #[inline]
    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Whether `bucket` may be accessed.
    pub fn is_allowed(&self, bucket: &str) -> bool {
        self.allowlist.is_empty() || self.allowlist.contains(bucket)
    }

    /// Static credentials from the configuration or the `AWS_*` variables.
    fn static_credentials(&self) -> Option<StaticProvider> {
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let config = &self.config;

        let access_key = config
            .access_key_id
            .clone()
            .or_else(|| env("AWS_ACCESS_KEY_ID"))?;
        let secret_key = config
            .secret_access_key
            .clone()
            .or_else(|| env("AWS_SECRET_ACCESS_KEY"))?;
        let session_token = config
            .session_token
            .clone()
            .or_else(|| env("AWS_SESSION_TOKEN"));

        Some(StaticProvider::new(
            &access_key,
            &secret_key,
            session_token.as_deref(),
        ))
    }

    /// Builds the client used for account-level calls.
    fn catalog_client(&self) -> Result<Client> {
        let config = &self.config;
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", config.region));

        let mut base_url: BaseUrl = endpoint.parse().map_err(|e| {
            Error::invalid_request(format!("invalid S3 endpoint '{endpoint}': {e}"))
        })?;
        base_url.region = config.region.clone();

        let client = match self.static_credentials() {
            Some(credentials) => Client::new(base_url, Some(Box::new(credentials)), None, None),
            None => Client::new(base_url, None, None, None),
        };
        client.map_err(|e| Error::Catalog {
            message: format!("failed to build S3 client: {e}"),
        })
    }

    fn connect(&self, bucket: &str) -> Result<ObjectStoreClient> {
        let config = &self.config;
        let options = ClientOptions::new()
            .with_connect_timeout(config.connect_timeout())
            .with_timeout(config.read_timeout());
        let retry = RetryConfig {
            max_retries: config.max_retries,
            ..Default::default()
        };

        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_region(&config.region)
            .with_client_options(options)
            .with_retry(retry);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
            if endpoint.starts_with("http://") {
                builder = builder.with_allow_http(true);
            }
        }

        if let Some(access_key) = &config.access_key_id {
            builder = builder.with_access_key_id(access_key);
        }

        if let Some(secret_key) = &config.secret_access_key {
            builder = builder.with_secret_access_key(secret_key);
        }

        if let Some(token) = &config.session_token {
            builder = builder.with_token(token);
        }

        let store = builder
            .build()
            .map_err(|e| Error::from_store(e, bucket, ""))?;

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            bucket = %bucket,
            region = %config.region,
            endpoint = ?config.endpoint,
            "Created S3 client"
        );

        Ok(ObjectStoreClient::new(bucket, store))
    }
}

#[async_trait::async_trait]
impl StoreProvider for S3Provider {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let client = self.catalog_client()?;
        let response = client.list_buckets().send().await.map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET_CLIENT,
                endpoint = ?self.config.endpoint,
                error = %e,
                "Failed to list S3 buckets"
            );
            Error::Catalog {
                message: e.to_string(),
            }
        })?;

        let names = response.buckets.into_iter().map(|bucket| bucket.name);
        let buckets = allowed_buckets(names, &self.allowlist);
        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            count = buckets.len(),
            allowlisted = !self.allowlist.is_empty(),
            "Listed S3 buckets"
        );
        Ok(buckets)
    }

    fn client(&self, bucket: &str) -> Result<ObjectStoreClient> {
        validate_bucket_name(bucket)?;
        if !self.is_allowed(bucket) {
            return Err(Error::bucket_not_allowed(bucket));
        }

        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = clients.get(bucket) {
            return Ok(client.clone());
        }

        let client = self.connect(bucket)?;
        clients.insert(bucket.to_owned(), client.clone());
        Ok(client)
    }
}

/// Keeps the store's buckets that `allowlist` permits; an empty allowlist
/// permits all.
fn allowed_buckets(
    names: impl IntoIterator<Item = String>,
    allowlist: &BTreeSet<String>,
) -> Vec<BucketInfo> {
    names
        .into_iter()
        .filter(|name| allowlist.is_empty() || allowlist.contains(name))
        .map(BucketInfo::new)
        .collect()
}

impl std::fmt::Debug for S3Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Provider")
            .field("region", &self.config.region)
            .field("endpoint", &self.config.endpoint)
            .field("allowlist", &self.allowlist)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;

    fn provider() -> S3Provider {
        let config = S3Config::new("us-east-1")
            .with_endpoint("http://localhost:9000")
            .with_credentials("test", "test")
            .with_buckets(["reports", " logs ", "", "reports"]);
        S3Provider::new(config)
    }

    #[test]
    fn catalog_is_filtered_by_allowlist() {
        let store = || ["archive", "logs", "reports"].map(String::from);

        let allowlist = provider().allowlist.clone();
        let names: Vec<_> = allowed_buckets(store(), &allowlist)
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["logs", "reports"]);

        let everything = allowed_buckets(store(), &BTreeSet::new());
        assert_eq!(everything.len(), 3);

        // Allowlisted names the store does not have are not listed.
        let missing = BTreeSet::from(["does-not-exist".to_owned()]);
        assert!(allowed_buckets(store(), &missing).is_empty());
    }

    #[tokio::test]
    async fn bucket_listing_contacts_the_store() {
        let config = S3Config::new("us-east-1")
            .with_endpoint("http://127.0.0.1:9")
            .with_credentials("test", "test")
            .with_buckets(["does-not-exist"]);
        let err = S3Provider::new(config).list_buckets().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreError);
        assert!(err.to_string().contains("failed to list buckets"));
    }

    #[test]
    fn denies_buckets_outside_allowlist() {
        let err = provider().client("secret").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
    }

    #[test]
    fn allowlisted_bucket_client_is_cached() {
        let provider = provider();
        let client = provider.client("reports").unwrap();
        assert_eq!(client.bucket(), "reports");
        provider.client("reports").unwrap();
        assert_eq!(provider.clients.lock().unwrap().len(), 1);
    }

    #[test]
    fn secrets_are_not_serialized() {
        let config = S3Config::new("eu-west-1").with_credentials("AKIA", "SECRET");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("SECRET"));
        assert!(!json.contains("AKIA"));
        assert!(json.contains("eu-west-1"));
    }

    #[test]
    fn validation() {
        assert!(S3Config::new("us-east-1").validate().is_ok());
        assert!(S3Config::new("").validate().is_err());
        assert!(
            S3Config::new("us-east-1")
                .with_endpoint("localhost:9000")
                .validate()
                .is_err()
        );
        let mut config = S3Config::new("us-east-1");
        config.access_key_id = Some("only-id".into());
        assert!(config.validate().is_err());
    }
}
