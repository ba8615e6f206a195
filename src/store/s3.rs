//! S3 backend built on `aws-sdk-s3`.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::provider::error::CredentialsError;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use thiserror::Error;
use tracing::{debug, instrument};

use super::{ListPage, ObjectBody, ObjectStore, StoreError};
use crate::sse::SseCustomerKey;

/// Region used when neither the caller nor the environment names one.
pub const DEFAULT_REGION: &str = "eu-central-1";

/// Errors raised while loading SDK configuration and credentials.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No credentials provider could be configured from the environment.
    #[error("no AWS credentials provider configured")]
    NoCredentialsProvider,

    /// The credentials chain failed to produce credentials.
    #[error("unable to load AWS credentials: {message}")]
    Credentials {
        /// Full error context from the provider chain.
        message: String,
        /// The underlying provider error.
        #[source]
        source: CredentialsError,
    },
}

/// Connection settings layered over the SDK's default discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct S3Options {
    /// Explicit region; otherwise env/profile, then [`DEFAULT_REGION`].
    pub region: Option<String>,
    /// Named profile from the shared config files.
    pub profile: Option<String>,
    /// Custom endpoint for S3-compatible services.
    pub endpoint_url: Option<String>,
    /// Use `endpoint/bucket/key` addressing instead of virtual hosts.
    pub force_path_style: bool,
}

/// Loads the shared SDK configuration and resolves credentials once.
///
/// Credentials are resolved eagerly so that a broken credential chain is
/// reported as a configuration failure before any listing is attempted.
///
/// # Errors
///
/// Returns [`ConfigError`] if no credentials can be resolved.
#[instrument(level = "debug", skip(options), fields(region = ?options.region, profile = ?options.profile))]
pub async fn load_sdk_config(options: &S3Options) -> Result<SdkConfig, ConfigError> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &options.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(profile) = &options.profile {
        loader = loader.profile_name(profile);
    }
    if let Some(endpoint_url) = &options.endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }

    let mut config = loader.load().await;
    if config.region().is_none() {
        debug!(region = DEFAULT_REGION, "no region discovered, using fallback");
        config = config
            .into_builder()
            .region(Region::new(DEFAULT_REGION))
            .build();
    }

    let provider = config
        .credentials_provider()
        .ok_or(ConfigError::NoCredentialsProvider)?;
    provider
        .provide_credentials()
        .await
        .map_err(|source| ConfigError::Credentials {
            message: DisplayErrorContext(&source).to_string(),
            source,
        })?;

    debug!(region = ?config.region(), "SDK configuration loaded");
    Ok(config)
}

/// [`ObjectStore`] backed by an S3 client handle.
///
/// The client is constructed once and passed in; there is no global client.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Builds a store from shared SDK configuration.
    #[must_use]
    pub fn new(config: &SdkConfig, force_path_style: bool) -> Self {
        let s3_config = aws_sdk_s3::config::Builder::from(config)
            .force_path_style(force_path_style)
            .build();
        Self::from_client(Client::from_conf(s3_config))
    }

    /// Wraps an already configured client.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    #[instrument(level = "debug", skip(self, continuation_token))]
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage, StoreError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(|e| StoreError::list(bucket, prefix, DisplayErrorContext(&e).to_string()))?;

        let keys: Vec<String> = output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();

        let next_continuation_token = if output.is_truncated().unwrap_or(false) {
            output.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        debug!(
            keys = keys.len(),
            truncated = next_continuation_token.is_some(),
            "listed page"
        );

        Ok(ListPage {
            keys,
            next_continuation_token,
        })
    }

    #[instrument(level = "debug", skip(self, sse))]
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        sse: &SseCustomerKey,
    ) -> Result<ObjectBody, StoreError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .sse_customer_algorithm(sse.algorithm())
            .sse_customer_key(sse.base64_key())
            .sse_customer_key_md5(sse.fingerprint())
            .send()
            .await
            .map_err(|e| StoreError::get(bucket, key, DisplayErrorContext(&e).to_string()))?;

        debug!(content_length = ?output.content_length(), "object retrieved");

        Ok(Box::pin(output.body.into_async_read()))
    }
}
