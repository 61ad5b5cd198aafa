//! S3 backend built on the AWS SDK.
//!
//! The SDK is async; the store owns a handle on a tokio runtime and blocks on
//! it so the rest of the application can stay synchronous. Calls may come from
//! several rayon workers at once, which `Runtime::block_on` permits.

use std::future::Future;
use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tokio::runtime::Runtime;
use tracing::debug;

use super::{ObjectStore, S3Uri};
use crate::error::{QcError, Result};

/// Connection settings for one S3 account/profile.
#[derive(Debug, Clone, Default)]
pub struct S3Settings {
    /// Named profile from the shared AWS config/credentials files.
    pub profile: Option<String>,
    pub region: Option<String>,
    /// Override for S3-compatible services (MinIO, Ceph, ...).
    pub endpoint_url: Option<String>,
}

pub struct S3Store {
    client: Client,
    runtime: Arc<Runtime>,
    profile: Option<String>,
}

impl S3Store {
    /// Build a multi-threaded runtime suitable for sharing between stores.
    pub fn runtime() -> Result<Arc<Runtime>> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        Ok(Arc::new(runtime))
    }

    pub fn connect(settings: &S3Settings, runtime: Arc<Runtime>) -> Result<Self> {
        let client = runtime.block_on(create_client(settings));
        debug!(
            "S3 client created (profile {:?}, endpoint {:?})",
            settings.profile, settings.endpoint_url
        );

        Ok(Self {
            client,
            runtime,
            profile: settings.profile.clone(),
        })
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }
}

async fn create_client(settings: &S3Settings) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(profile) = &settings.profile {
        loader = loader.profile_name(profile);
    }
    if let Some(region) = &settings.region {
        loader = loader.region(Region::new(region.clone()));
    }
    let sdk_config = loader.load().await;

    let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
    if let Some(url) = &settings.endpoint_url {
        builder = builder.endpoint_url(url).force_path_style(true);
    }

    Client::from_conf(builder.build())
}

impl ObjectStore for S3Store {
    fn list_children(&self, prefix: &str) -> Result<Vec<String>> {
        let uri = S3Uri::parse(prefix)?;
        let key_prefix = uri.dir_prefix();

        self.block_on(async {
            let mut children = Vec::new();
            let mut continuation: Option<String> = None;

            loop {
                let output = self
                    .client
                    .list_objects_v2()
                    .bucket(&uri.bucket)
                    .prefix(&key_prefix)
                    .delimiter("/")
                    .set_continuation_token(continuation.take())
                    .send()
                    .await
                    .map_err(|e| {
                        QcError::Transport(format!("list {}: {}", prefix, DisplayErrorContext(&e)))
                    })?;

                for common in output.common_prefixes() {
                    if let Some(child) = common.prefix() {
                        children.push(format!("s3://{}/{}", uri.bucket, child.trim_end_matches('/')));
                    }
                }

                match output.next_continuation_token() {
                    Some(token) => continuation = Some(token.to_string()),
                    None => break,
                }
            }

            Ok(children)
        })
    }

    fn read(&self, uri: &str) -> Result<Vec<u8>> {
        let parsed = S3Uri::parse(uri)?;

        self.block_on(async {
            let object = self
                .client
                .get_object()
                .bucket(&parsed.bucket)
                .key(&parsed.key)
                .send()
                .await
                .map_err(|e| QcError::Transport(format!("get {}: {}", uri, DisplayErrorContext(&e))))?;

            let collected = object
                .body
                .collect()
                .await
                .map_err(|e| QcError::Transport(format!("download {}: {}", uri, e)))?;

            Ok(collected.into_bytes().to_vec())
        })
    }

    fn write(&self, uri: &str, bytes: &[u8]) -> Result<()> {
        let parsed = S3Uri::parse(uri)?;

        self.block_on(async {
            self.client
                .put_object()
                .bucket(&parsed.bucket)
                .key(&parsed.key)
                .body(ByteStream::from(bytes.to_vec()))
                .send()
                .await
                .map_err(|e| QcError::Transport(format!("put {}: {}", uri, DisplayErrorContext(&e))))?;
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "s3"
    }
}
