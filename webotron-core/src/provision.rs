//! Bucket provisioning: create (or adopt) a bucket, make it publicly readable
//! and turn on static website hosting.
//!
//! Every call re-applies the policy and website configuration, so running it
//! twice against the same bucket leaves the same final state.

use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

use crate::config::WebsiteConfig;
use crate::contract::{StorageClient, StorageError};

/// A bucket ready to serve a static site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub name: String,
    /// The JSON policy document that was attached.
    pub policy: String,
    pub website: WebsiteConfig,
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("failed to create bucket `{bucket}`")]
    Create {
        bucket: String,
        #[source]
        source: StorageError,
    },
    #[error("failed to attach public-read policy to bucket `{bucket}`")]
    Policy {
        bucket: String,
        #[source]
        source: StorageError,
    },
    #[error("failed to enable website hosting on bucket `{bucket}`")]
    Website {
        bucket: String,
        #[source]
        source: StorageError,
    },
}

/// Policy document granting anonymous read on every object in `bucket`.
pub fn public_read_policy(bucket: &str) -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Sid": "PublicReadGetObject",
            "Effect": "Allow",
            "Principal": "*",
            "Action": ["s3:GetObject"],
            "Resource": [format!("arn:aws:s3:::{bucket}/*")]
        }]
    })
    .to_string()
}

/// Ensure `name` exists and is configured for public static hosting.
///
/// A bucket the caller already owns is adopted; any other creation failure,
/// including a name taken by another account, is returned as is.
pub async fn ensure_bucket<C>(
    client: &C,
    name: &str,
    website: &WebsiteConfig,
) -> Result<Bucket, ProvisionError>
where
    C: StorageClient + ?Sized,
{
    info!(bucket = %name, "[SETUP] Creating bucket");
    match client.create_bucket(name).await {
        Ok(()) => info!(bucket = %name, "[SETUP] Bucket created"),
        Err(StorageError::BucketAlreadyOwned(_)) => {
            info!(bucket = %name, "[SETUP] Bucket already owned by caller, reusing it")
        }
        Err(e) => {
            error!(bucket = %name, error = %e, "[SETUP][ERROR] create_bucket failed");
            return Err(ProvisionError::Create {
                bucket: name.to_string(),
                source: e,
            });
        }
    }

    let policy = public_read_policy(name);
    client
        .put_bucket_policy(name, &policy)
        .await
        .map_err(|e| {
            error!(bucket = %name, error = %e, "[SETUP][ERROR] put_bucket_policy failed");
            ProvisionError::Policy {
                bucket: name.to_string(),
                source: e,
            }
        })?;
    info!(bucket = %name, "[SETUP] Public-read policy attached");

    client
        .put_bucket_website(name, website)
        .await
        .map_err(|e| {
            error!(bucket = %name, error = %e, "[SETUP][ERROR] put_bucket_website failed");
            ProvisionError::Website {
                bucket: name.to_string(),
                source: e,
            }
        })?;
    info!(
        bucket = %name,
        index_document = %website.index_document,
        error_document = %website.error_document,
        "[SETUP] Website hosting enabled"
    );

    Ok(Bucket {
        name: name.to_string(),
        policy,
        website: website.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_grants_public_get_on_bucket_objects() {
        let policy: serde_json::Value =
            serde_json::from_str(&public_read_policy("test-bucket")).unwrap();
        let statement = &policy["Statement"][0];

        assert_eq!(policy["Version"], "2012-10-17");
        assert_eq!(statement["Sid"], "PublicReadGetObject");
        assert_eq!(statement["Effect"], "Allow");
        assert_eq!(statement["Principal"], "*");
        assert_eq!(statement["Action"][0], "s3:GetObject");
        assert_eq!(statement["Resource"][0], "arn:aws:s3:::test-bucket/*");
    }

    #[test]
    fn policy_depends_only_on_bucket_name() {
        assert_eq!(public_read_policy("a"), public_read_policy("a"));
        assert_ne!(public_read_policy("a"), public_read_policy("b"));
    }
}
