//! Object storage uploads
//!
//! `ObjectStore` is the seam between backup logic and the S3 client so that
//! uploads can be mocked in tests. `S3Store` drives the async AWS SDK on its
//! own current-thread runtime, keeping the rest of the tool synchronous.

use crate::config::StorageConfig;
use anyhow::{Context, Result};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::{ByteStream, Length};
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Files above this size are sent as multipart uploads
const MULTIPART_THRESHOLD: u64 = 64 * 1024 * 1024;
/// Size of each multipart part
const PART_SIZE: u64 = 64 * 1024 * 1024;

/// Storage-level failures; these are the only errors an upload reports as `false`
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Local file does not exist: {0:?}")]
    MissingFile(PathBuf),

    #[error("Failed to read {path:?}: {message}")]
    Body { path: PathBuf, message: String },

    #[error("S3 request failed: {0}")]
    Service(String),
}

fn service_error<E: std::error::Error + 'static>(err: E) -> StorageError {
    StorageError::Service(DisplayErrorContext(err).to_string())
}

/// Abstraction over the object storage client
pub trait ObjectStore: Send + Sync {
    /// Upload a local file to `bucket/key`
    fn put_file(&self, local_path: &Path, bucket: &str, key: &str)
        -> std::result::Result<(), StorageError>;
}

/// S3 implementation backed by aws-sdk-s3
pub struct S3Store {
    client: aws_sdk_s3::Client,
    runtime: tokio::runtime::Runtime,
}

impl S3Store {
    /// Build a client from the ambient AWS configuration plus overrides
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to build runtime for S3 client")?;

        let client = runtime.block_on(async {
            let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
            if let Some(ref region) = config.region {
                loader = loader.region(aws_sdk_s3::config::Region::new(region.clone()));
            }
            let shared = loader.load().await;

            let mut builder = aws_sdk_s3::config::Builder::from(&shared);
            if let Some(ref endpoint) = config.endpoint_url {
                builder = builder.endpoint_url(endpoint).force_path_style(true);
            }
            aws_sdk_s3::Client::from_conf(builder.build())
        });

        Ok(Self { client, runtime })
    }

    async fn put_single(&self, local_path: &Path, bucket: &str, key: &str)
        -> std::result::Result<(), StorageError>
    {
        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| StorageError::Body {
                path: local_path.to_path_buf(),
                message: e.to_string(),
            })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(service_error)?;

        Ok(())
    }

    async fn put_multipart(&self, local_path: &Path, bucket: &str, key: &str, size: u64)
        -> std::result::Result<(), StorageError>
    {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(service_error)?;

        let upload_id = created
            .upload_id()
            .ok_or_else(|| StorageError::Service("missing multipart upload id".to_string()))?
            .to_string();

        match self.upload_parts(local_path, bucket, key, &upload_id, size).await {
            Ok(parts) => {
                self.client
                    .complete_multipart_upload()
                    .bucket(bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .multipart_upload(
                        CompletedMultipartUpload::builder()
                            .set_parts(Some(parts))
                            .build(),
                    )
                    .send()
                    .await
                    .map_err(service_error)?;
                Ok(())
            }
            Err(e) => {
                if let Err(abort_err) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    warn!(
                        "Failed to abort multipart upload {}: {}",
                        upload_id,
                        DisplayErrorContext(abort_err)
                    );
                }
                Err(e)
            }
        }
    }

    async fn upload_parts(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        upload_id: &str,
        size: u64,
    ) -> std::result::Result<Vec<CompletedPart>, StorageError> {
        let mut parts = Vec::new();
        let mut offset = 0;
        let mut part_number: i32 = 1;

        while offset < size {
            let length = PART_SIZE.min(size - offset);
            let body = ByteStream::read_from()
                .path(local_path)
                .offset(offset)
                .length(Length::Exact(length))
                .build()
                .await
                .map_err(|e| StorageError::Body {
                    path: local_path.to_path_buf(),
                    message: e.to_string(),
                })?;

            let uploaded = self
                .client
                .upload_part()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(body)
                .send()
                .await
                .map_err(service_error)?;

            debug!("Uploaded part {} of {:?}", part_number, local_path);

            parts.push(
                CompletedPart::builder()
                    .e_tag(uploaded.e_tag().unwrap_or_default())
                    .part_number(part_number)
                    .build(),
            );

            offset += length;
            part_number += 1;
        }

        Ok(parts)
    }
}

impl ObjectStore for S3Store {
    fn put_file(&self, local_path: &Path, bucket: &str, key: &str)
        -> std::result::Result<(), StorageError>
    {
        let size = std::fs::metadata(local_path)
            .map_err(|_| StorageError::MissingFile(local_path.to_path_buf()))?
            .len();

        self.runtime.block_on(async {
            if size > MULTIPART_THRESHOLD {
                self.put_multipart(local_path, bucket, key, size).await
            } else {
                self.put_single(local_path, bucket, key).await
            }
        })
    }
}

/// Join a key prefix and a relative path with exactly one `/` between them
///
/// Backslashes are normalized to forward slashes.
pub fn join_key(prefix: &str, relative: &str) -> String {
    let prefix = prefix.replace('\\', "/");
    let relative = relative.replace('\\', "/");
    let prefix = prefix.trim_end_matches('/');
    let relative = relative.trim_start_matches('/');

    if prefix.is_empty() {
        relative.to_string()
    } else {
        format!("{}/{}", prefix, relative)
    }
}

/// Destination key for a file: prefix joined with the file's base name
pub fn object_key(prefix: &str, local_path: &Path) -> String {
    let file_name = local_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    join_key(prefix, &file_name)
}

/// Upload `local_path` to `bucket` under `prefix/<file name>`
///
/// Returns `false` without calling the store when the file is absent.
pub fn upload_file(store: &dyn ObjectStore, local_path: &Path, bucket: &str, prefix: &str) -> bool {
    let key = object_key(prefix, local_path);
    upload_to_key(store, local_path, bucket, &key)
}

/// Upload `local_path` to an explicit key, logging the outcome
pub fn upload_to_key(store: &dyn ObjectStore, local_path: &Path, bucket: &str, key: &str) -> bool {
    if !local_path.is_file() {
        error!("File does not exist, not uploading: {:?}", local_path);
        return false;
    }

    match store.put_file(local_path, bucket, key) {
        Ok(()) => {
            info!("Uploaded {:?} -> s3://{}/{}", local_path, bucket, key);
            true
        }
        Err(e) => {
            error!("Upload failed {:?} -> s3://{}/{}: {}", local_path, bucket, key, e);
            false
        }
    }
}

/// Mock object store for testing
/// Available for use in external test crates
pub mod mock {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Recorded upload
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct PutCall {
        pub local_path: PathBuf,
        pub bucket: String,
        pub key: String,
    }

    /// Mock object store that records uploads
    #[derive(Clone, Default)]
    pub struct MockObjectStore {
        pub calls: Arc<Mutex<Vec<PutCall>>>,
        /// Fail every upload
        should_fail: Arc<Mutex<bool>>,
        /// Fail uploads whose key contains one of these fragments
        failing_keys: Arc<Mutex<Vec<String>>>,
    }

    impl MockObjectStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Configure every upload to fail
        pub fn with_failing_uploads(self) -> Self {
            *self.should_fail.lock().unwrap() = true;
            self
        }

        /// Configure uploads whose key contains `fragment` to fail
        pub fn failing_key(self, fragment: &str) -> Self {
            self.failing_keys.lock().unwrap().push(fragment.to_string());
            self
        }

        /// Get all recorded uploads
        pub fn get_calls(&self) -> Vec<PutCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Recorded keys, in call order
        pub fn keys(&self) -> Vec<String> {
            self.get_calls().into_iter().map(|c| c.key).collect()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl ObjectStore for MockObjectStore {
        fn put_file(&self, local_path: &Path, bucket: &str, key: &str)
            -> std::result::Result<(), StorageError>
        {
            self.calls.lock().unwrap().push(PutCall {
                local_path: local_path.to_path_buf(),
                bucket: bucket.to_string(),
                key: key.to_string(),
            });

            let fails = *self.should_fail.lock().unwrap()
                || self
                    .failing_keys
                    .lock()
                    .unwrap()
                    .iter()
                    .any(|f| key.contains(f.as_str()));

            if fails {
                return Err(StorageError::Service("AccessDenied (mock)".to_string()));
            }
            Ok(())
        }
    }
}
