use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;
use webotron::cli::{execute, run, Cli, Commands};
use webotron_core::config::WebsiteConfig;
use webotron_core::contract::{BucketSummary, MockStorageClient, ObjectSummary, StorageError};

fn cli_for(command: Commands) -> Cli {
    Cli {
        config: None,
        profile: None,
        region: None,
        endpoint_url: None,
        command,
    }
}

#[test]
fn sync_cli_rejects_missing_path_before_contacting_aws() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("no-such-site");

    let mut cmd = Command::cargo_bin("webotron").expect("Binary exists");
    cmd.arg("sync")
        .arg(&missing)
        .arg("test-bucket")
        .env("RUST_LOG", "off");

    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("path not found"));
}

/// A path under a regular file fails with ENOTDIR, which is not "not found".
#[test]
fn sync_cli_reports_unreadable_path_as_io_error() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("index.html");
    fs::write(&file, "<h1>hello</h1>").unwrap();

    let mut cmd = Command::cargo_bin("webotron").expect("Binary exists");
    cmd.arg("sync")
        .arg(file.join("child"))
        .arg("test-bucket")
        .env("RUST_LOG", "off");

    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("failed to read"))
        .stderr(predicate::str::contains("path not found").not());
}

#[test]
fn cli_requires_bucket_argument() {
    let mut cmd = Command::cargo_bin("webotron").expect("Binary exists");
    cmd.arg("list-bucket-objects");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("<BUCKET>"));
}

#[test]
fn cli_help_lists_all_commands() {
    let mut cmd = Command::cargo_bin("webotron").expect("Binary exists");
    cmd.arg("--help");

    cmd.assert().success().stdout(
        predicate::str::contains("list-buckets")
            .and(predicate::str::contains("list-bucket-objects"))
            .and(predicate::str::contains("setup-bucket"))
            .and(predicate::str::contains("sync")),
    );
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let msg = format!("{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    let dir = tempdir().unwrap();
    let cli = cli_for(Commands::Sync {
        pathname: dir.path().join("missing"),
        bucket: "test-bucket".into(),
    });

    let result = run(cli).await;
    assert!(result.is_err(), "Missing path must fail the run");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}

#[tokio::test]
async fn list_buckets_prints_one_line_per_bucket() {
    let mut client = MockStorageClient::new();
    client.expect_list_buckets().returning(|| {
        Ok(vec![
            BucketSummary {
                name: "site-a".into(),
                created: Some("2024-01-01T00:00:00Z".into()),
            },
            BucketSummary {
                name: "site-b".into(),
                created: None,
            },
        ])
    });

    let mut out = Vec::new();
    execute(
        Commands::ListBuckets,
        &client,
        &WebsiteConfig::default(),
        &mut out,
    )
    .await
    .expect("list-buckets should succeed");

    let out = String::from_utf8(out).unwrap();
    assert_eq!(out, "site-a\t2024-01-01T00:00:00Z\nsite-b\t-\n");
}

#[tokio::test]
async fn list_bucket_objects_prints_keys_and_sizes() {
    let mut client = MockStorageClient::new();
    client
        .expect_list_objects()
        .withf(|bucket| bucket == "site-a")
        .returning(|_| {
            Ok(vec![ObjectSummary {
                key: "css/style.css".into(),
                size: Some(42),
                last_modified: None,
            }])
        });

    let mut out = Vec::new();
    execute(
        Commands::ListBucketObjects {
            bucket: "site-a".into(),
        },
        &client,
        &WebsiteConfig::default(),
        &mut out,
    )
    .await
    .expect("list-bucket-objects should succeed");

    assert_eq!(String::from_utf8(out).unwrap(), "css/style.css\t42\n");
}

#[tokio::test]
async fn list_bucket_objects_surfaces_storage_errors() {
    let mut client = MockStorageClient::new();
    client
        .expect_list_objects()
        .returning(|_| Err(StorageError::api("ListObjectsV2", "NoSuchBucket")));

    let mut out = Vec::new();
    let err = execute(
        Commands::ListBucketObjects {
            bucket: "gone".into(),
        },
        &client,
        &WebsiteConfig::default(),
        &mut out,
    )
    .await
    .unwrap_err();

    let chain = format!("{err:#}");
    assert!(chain.contains("gone"), "got: {chain}");
    assert!(chain.contains("NoSuchBucket"), "got: {chain}");
}

#[tokio::test]
async fn setup_bucket_reuses_owned_bucket() {
    let mut client = MockStorageClient::new();
    client
        .expect_create_bucket()
        .returning(|bucket| Err(StorageError::BucketAlreadyOwned(bucket.to_string())));
    client.expect_put_bucket_policy().times(1).returning(|_, _| Ok(()));
    client.expect_put_bucket_website().times(1).returning(|_, _| Ok(()));

    let mut out = Vec::new();
    execute(
        Commands::SetupBucket {
            bucket: "test-bucket".into(),
        },
        &client,
        &WebsiteConfig::default(),
        &mut out,
    )
    .await
    .expect("setup-bucket should succeed on an owned bucket");

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("test-bucket"));
    assert!(out.contains("index.html"));
}

#[tokio::test]
async fn sync_command_reports_uploaded_files() {
    let site = tempdir().unwrap();
    fs::write(site.path().join("index.html"), "<p>hi</p>").unwrap();

    let mut client = MockStorageClient::new();
    client
        .expect_upload_file()
        .withf(|bucket, _path, key, content_type| {
            bucket == "test-bucket" && key == "index.html" && content_type == "text/html"
        })
        .times(1)
        .returning(|_, _, _, _| Ok(()));

    let mut out = Vec::new();
    execute(
        Commands::Sync {
            pathname: PathBuf::from(site.path()),
            bucket: "test-bucket".into(),
        },
        &client,
        &WebsiteConfig::default(),
        &mut out,
    )
    .await
    .expect("sync should succeed");

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("upload: index.html (text/html)"));
    assert!(out.contains("Synced 1 files"));
}
