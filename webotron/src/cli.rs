//! This module implements the CLI interface for webotron: command parsing,
//! argument validation, the async entrypoint and user-visible output.
//!
//! All provisioning and synchronisation logic lives in [`webotron-core`]; this
//! module only wires configuration, the S3 client and stdout together.
//!
//! ## How To Use
//! - From the shell: `webotron --help`.
//! - Programmatically: call [`run`] with a constructed [`Cli`], or [`execute`]
//!   with any [`StorageClient`] (tests pass a mock).
//!
//! [`webotron-core`]: ../../webotron-core/

use crate::load_config::{load_config, CliConfig};
use crate::s3::S3Storage;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use webotron_core::config::WebsiteConfig;
use webotron_core::contract::StorageClient;
use webotron_core::provision::ensure_bucket;
use webotron_core::synchronise::{sync, SyncError};
use webotron_core::tree::{DirectoryTree, LocalTree};

/// Webotron deploys websites to AWS.
#[derive(Parser, Debug)]
#[clap(name = "webotron", version, about = "Webotron deploys static websites to AWS S3")]
pub struct Cli {
    /// Path to a YAML config file (aws and website sections)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Named AWS credentials profile
    #[clap(long, env = "WEBOTRON_PROFILE", global = true)]
    pub profile: Option<String>,

    /// AWS region
    #[clap(long, env = "WEBOTRON_REGION", global = true)]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint, e.g. http://localhost:4566
    #[clap(long, env = "WEBOTRON_ENDPOINT_URL", global = true)]
    pub endpoint_url: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all buckets
    ListBuckets,
    /// List objects in a bucket
    ListBucketObjects {
        bucket: String,
    },
    /// Create and configure a bucket for static website hosting
    SetupBucket {
        bucket: String,
    },
    /// Sync contents of PATHNAME to BUCKET
    Sync {
        pathname: PathBuf,
        bucket: String,
    },
}

impl Cli {
    /// File configuration (if any) with command-line overrides applied.
    pub fn resolve_config(&self) -> Result<CliConfig> {
        let file_config = match &self.config {
            Some(path) => load_config(path)?,
            None => CliConfig::default(),
        };
        Ok(file_config.with_overrides(
            self.profile.clone(),
            self.region.clone(),
            self.endpoint_url.clone(),
        ))
    }
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let config = cli.resolve_config()?;

    // Bad paths are an argument error: report them before touching AWS.
    if let Commands::Sync { pathname, .. } = &cli.command {
        match LocalTree.resolve(pathname) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::error!(path = %pathname.display(), "Sync path does not exist");
                return Err(SyncError::PathNotFound {
                    path: pathname.clone(),
                }
                .into());
            }
            Err(e) => {
                tracing::error!(path = %pathname.display(), error = %e, "Sync path cannot be resolved");
                return Err(SyncError::Io {
                    path: pathname.clone(),
                    source: e,
                }
                .into());
            }
        }
    }

    let client = S3Storage::connect(&config.aws).await;
    let mut stdout = std::io::stdout();
    execute(cli.command, &client, &config.website, &mut stdout).await
}

/// Run one command against `client`, writing user-facing output to `out`.
pub async fn execute<C, W>(
    command: Commands,
    client: &C,
    website: &WebsiteConfig,
    out: &mut W,
) -> Result<()>
where
    C: StorageClient + ?Sized,
    W: Write,
{
    match command {
        Commands::ListBuckets => {
            tracing::info!(command = "list-buckets", "Listing buckets");
            let buckets = client
                .list_buckets()
                .await
                .context("Failed to list buckets")?;
            for bucket in buckets {
                writeln!(
                    out,
                    "{}\t{}",
                    bucket.name,
                    bucket.created.as_deref().unwrap_or("-")
                )?;
            }
        }
        Commands::ListBucketObjects { bucket } => {
            tracing::info!(command = "list-bucket-objects", bucket = %bucket, "Listing objects");
            let objects = client
                .list_objects(&bucket)
                .await
                .with_context(|| format!("Failed to list objects in bucket `{bucket}`"))?;
            for object in objects {
                let size = object
                    .size
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string());
                writeln!(out, "{}\t{}", object.key, size)?;
            }
        }
        Commands::SetupBucket { bucket } => {
            tracing::info!(command = "setup-bucket", bucket = %bucket, "Starting bucket setup");
            let configured = ensure_bucket(client, &bucket, website).await?;
            writeln!(
                out,
                "Bucket {} is set up for static website hosting (index: {}, error: {})",
                configured.name, configured.website.index_document, configured.website.error_document
            )?;
        }
        Commands::Sync { pathname, bucket } => {
            tracing::info!(command = "sync", bucket = %bucket, "Starting synchronisation process");
            let report = sync(client, &LocalTree, &pathname, &bucket).await?;
            for object in &report.objects {
                writeln!(out, "upload: {} ({})", object.key, object.content_type)?;
            }
            writeln!(
                out,
                "Synced {} files from {} to {}",
                report.objects.len(),
                report.root.display(),
                report.bucket
            )?;
        }
    }
    Ok(())
}
