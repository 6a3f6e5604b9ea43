#![doc = "AWS S3 implementation of the core storage contract."]
//! # S3 Storage (CLI <-> Core)
//!
//! This module bridges [`webotron_core::contract::StorageClient`] to the AWS
//! SDK. [`S3Storage`] is built once per invocation from a
//! [`ClientConfig`] and handed by reference to the provisioner and the
//! synchroniser.
//!
//! - Credentials come from the default provider chain, scoped to the
//!   configured profile when one is given.
//! - A custom endpoint (LocalStack, MinIO) switches on path-style addressing.
//! - Outside `us-east-1`, bucket creation carries a location constraint for
//!   the client's region.
//!
//! SDK errors are flattened into [`StorageError::Api`] with the full error
//! context rendered, except `BucketAlreadyOwnedByYou` on creation which maps to
//! [`StorageError::BucketAlreadyOwned`].

use std::path::Path;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::{ByteStream, DateTimeFormat};
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, ErrorDocument, IndexDocument,
    WebsiteConfiguration,
};
use aws_sdk_s3::Client;

use webotron_core::config::{ClientConfig, WebsiteConfig};
use webotron_core::contract::{BucketSummary, ObjectSummary, StorageClient, StorageError};

/// Region in which S3 rejects an explicit location constraint.
const DEFAULT_S3_REGION: &str = "us-east-1";

pub struct S3Storage {
    client: Client,
    region: Option<String>,
}

impl S3Storage {
    /// Resolve the AWS configuration for `config` and build the S3 client.
    pub async fn connect(config: &ClientConfig) -> Self {
        config.trace_loaded();
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let region = sdk_config.region().map(|r| r.as_ref().to_string());

        let builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        let s3_config = if config.endpoint_url.is_some() {
            builder.force_path_style(true).build()
        } else {
            builder.build()
        };

        tracing::info!(
            region = region.as_deref().unwrap_or("<unset>"),
            path_style = config.endpoint_url.is_some(),
            "Initialized S3Storage"
        );
        Self {
            client: Client::from_conf(s3_config),
            region,
        }
    }
}

/// us-east-1 (and an unset region) must not send a location constraint.
fn location_constraint(region: Option<&str>) -> Option<BucketLocationConstraint> {
    match region {
        Some(region) if region != DEFAULT_S3_REGION => Some(BucketLocationConstraint::from(region)),
        _ => None,
    }
}

fn api_error<E>(operation: &'static str, err: E) -> StorageError
where
    E: std::error::Error,
{
    let message = DisplayErrorContext(err).to_string();
    tracing::error!(operation, error = %message, "S3 request failed");
    StorageError::api(operation, message)
}

#[async_trait]
impl StorageClient for S3Storage {
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>, StorageError> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| api_error("ListBuckets", e))?;

        Ok(output
            .buckets()
            .iter()
            .map(|bucket| BucketSummary {
                name: bucket.name().unwrap_or_default().to_string(),
                created: bucket
                    .creation_date()
                    .and_then(|date| date.fmt(DateTimeFormat::DateTime).ok()),
            })
            .collect())
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if let Some(constraint) = location_constraint(self.region.as_deref()) {
            tracing::debug!(bucket, constraint = %constraint.as_str(), "Adding location constraint");
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(constraint)
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_bucket_already_owned_by_you()) =>
            {
                Err(StorageError::BucketAlreadyOwned(bucket.to_string()))
            }
            Err(err) => Err(api_error("CreateBucket", err)),
        }
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), StorageError> {
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(|e| api_error("PutBucketPolicy", e))?;
        Ok(())
    }

    async fn get_bucket_policy(&self, bucket: &str) -> Result<Option<String>, StorageError> {
        match self.client.get_bucket_policy().bucket(bucket).send().await {
            Ok(output) => Ok(output.policy().map(str::to_string)),
            Err(err)
                if err.as_service_error().and_then(|e| e.code()) == Some("NoSuchBucketPolicy") =>
            {
                Ok(None)
            }
            Err(err) => Err(api_error("GetBucketPolicy", err)),
        }
    }

    async fn put_bucket_website(
        &self,
        bucket: &str,
        website: &WebsiteConfig,
    ) -> Result<(), StorageError> {
        let index = IndexDocument::builder()
            .suffix(&website.index_document)
            .build()
            .map_err(|e| api_error("PutBucketWebsite", e))?;
        let error = ErrorDocument::builder()
            .key(&website.error_document)
            .build()
            .map_err(|e| api_error("PutBucketWebsite", e))?;
        let configuration = WebsiteConfiguration::builder()
            .index_document(index)
            .error_document(error)
            .build();

        self.client
            .put_bucket_website()
            .bucket(bucket)
            .website_configuration(configuration)
            .send()
            .await
            .map_err(|e| api_error("PutBucketWebsite", e))?;
        Ok(())
    }

    async fn get_bucket_website(
        &self,
        bucket: &str,
    ) -> Result<Option<WebsiteConfig>, StorageError> {
        match self.client.get_bucket_website().bucket(bucket).send().await {
            // A website without an index document redirects everything; not ours.
            Ok(output) => Ok(output.index_document().map(|index| WebsiteConfig {
                index_document: index.suffix().to_string(),
                error_document: output
                    .error_document()
                    .map(|e| e.key().to_string())
                    .unwrap_or_default(),
            })),
            Err(err)
                if err.as_service_error().and_then(|e| e.code())
                    == Some("NoSuchWebsiteConfiguration") =>
            {
                Ok(None)
            }
            Err(err) => Err(api_error("GetBucketWebsite", err)),
        }
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectSummary>, StorageError> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| api_error("ListObjectsV2", e))?;
            for object in page.contents() {
                objects.push(ObjectSummary {
                    key: object.key().unwrap_or_default().to_string(),
                    size: object.size(),
                    last_modified: object
                        .last_modified()
                        .and_then(|date| date.fmt(DateTimeFormat::DateTime).ok()),
                });
            }
        }
        tracing::debug!(bucket, count = objects.len(), "Listed objects");
        Ok(objects)
    }

    async fn upload_file(
        &self,
        bucket: &str,
        path: &Path,
        key: &str,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| api_error("PutObject", e))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| api_error("PutObject", e))?;
        Ok(())
    }
}
