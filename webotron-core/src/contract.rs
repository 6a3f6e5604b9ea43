//! # contract: the storage API the provisioner and synchroniser run against
//!
//! This module defines a single trait ([`StorageClient`]) plus the plain data
//! types it exchanges. The AWS implementation lives in the CLI crate; tests use
//! the `mockall`-generated `MockStorageClient`, exported through the
//! `test-export-mocks` feature so downstream crates can mock it too.
//!
//! ## Errors
//! Every operation returns [`StorageError`]. Implementors must map the
//! "bucket already exists and you own it" condition of bucket creation to
//! [`StorageError::BucketAlreadyOwned`]; everything else becomes
//! [`StorageError::Api`] carrying the operation name and the upstream message.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::WebsiteConfig;

/// A bucket as reported by the list-buckets operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSummary {
    pub name: String,
    /// Creation timestamp as rendered by the backend, when it reports one.
    pub created: Option<String>,
}

/// An object as reported by the list-objects operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: Option<i64>,
    pub last_modified: Option<String>,
}

#[derive(Debug, Error)]
pub enum StorageError {
    /// Bucket creation found an existing bucket of that name owned by the caller.
    #[error("bucket `{0}` already exists and is owned by you")]
    BucketAlreadyOwned(String),
    #[error("{operation} failed: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },
}

impl StorageError {
    pub fn api(operation: &'static str, message: impl Into<String>) -> Self {
        StorageError::Api {
            operation,
            message: message.into(),
        }
    }
}

/// Operations consumed from an object-storage service.
///
/// The trait is `Send` + `Sync` and intended for async/await usage. All calls
/// are awaited one at a time by the callers in this crate.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// List every bucket owned by the caller.
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>, StorageError>;

    /// Create a bucket. Returns [`StorageError::BucketAlreadyOwned`] when the
    /// caller already owns a bucket of that name.
    async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError>;

    /// Replace the bucket's access policy with the given JSON document.
    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), StorageError>;

    /// Fetch the bucket's access policy, `None` when no policy is attached.
    async fn get_bucket_policy(&self, bucket: &str) -> Result<Option<String>, StorageError>;

    /// Enable static website hosting with the given documents.
    async fn put_bucket_website(
        &self,
        bucket: &str,
        website: &WebsiteConfig,
    ) -> Result<(), StorageError>;

    /// Fetch the website configuration, `None` when hosting is not enabled.
    async fn get_bucket_website(&self, bucket: &str)
        -> Result<Option<WebsiteConfig>, StorageError>;

    /// List every object in the bucket, following pagination.
    async fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectSummary>, StorageError>;

    /// Upload the local file at `path` under `key`, overwriting any existing object.
    async fn upload_file(
        &self,
        bucket: &str,
        path: &Path,
        key: &str,
        content_type: &str,
    ) -> Result<(), StorageError>;
}
