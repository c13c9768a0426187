//! # CLI Tests
//!
//! Runs the `workorder` binary against a `wiremock` Directus server.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Writes a fixture file into `dir` and returns its path.
fn create_fixture_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let file_path = dir.join(name);
    fs::write(&file_path, content).expect("Failed to write fixture file");
    file_path
}

fn leak_definition(dir: &Path, priority: &str) -> PathBuf {
    let definition = json!({
        "workorders": [{
            "title": "漏水",
            "category": "plumbing",
            "description": "厨房漏水",
            "building": "咏兰阁",
            "email": "a@x.com",
            "priority": priority
        }]
    });
    create_fixture_file(dir, "workorders.json", &definition.to_string())
}

fn media_map(dir: &Path) -> PathBuf {
    create_fixture_file(dir, "media.csv", "file_name,file_id\na.jpg,F1\nb.jpg,F2\n")
}

/// A command isolated from any Directus settings in the caller's environment.
fn workorder_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("workorder").unwrap();
    cmd.current_dir(dir)
        .env_remove("DIRECTUS_URL")
        .env_remove("DIRECTUS_TOKEN")
        .env_remove("COMMUNITY_ID")
        .env_remove("SUBMITTER_ID")
        .env("RUST_LOG", "info");
    cmd
}

async fn mount_user_lookup(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("filter[email][_eq]", "a@x.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [{ "id": "U1" }] })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_dry_run_prints_payload_without_creating() {
    // --- 1. Arrange ---
    let server = MockServer::start().await;
    mount_user_lookup(&server).await;
    Mock::given(method("POST"))
        .and(path("/items/work_orders"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let temp_dir = tempdir().unwrap();
    let definition = leak_definition(temp_dir.path(), "high");
    let media = media_map(temp_dir.path());

    // --- 2. Act & 3. Assert ---
    workorder_cmd(temp_dir.path())
        .arg("--directus-url")
        .arg(server.uri())
        .arg("--token")
        .arg("test-token")
        .arg("create")
        .arg(&definition)
        .arg("--media-map")
        .arg(&media)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"漏水\""))
        .stdout(predicate::str::contains("\"submitter_id\": \"U1\""))
        .stdout(predicate::str::contains("\"priority\": \"high\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_posts_each_entry() {
    let server = MockServer::start().await;
    mount_user_lookup(&server).await;
    Mock::given(method("GET"))
        .and(path("/server/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "project": { "project_name": "Community Portal" } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/items/work_orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": "wo-1" } })))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = tempdir().unwrap();
    let definition = leak_definition(temp_dir.path(), "low");
    let media = media_map(temp_dir.path());

    workorder_cmd(temp_dir.path())
        .arg("--directus-url")
        .arg(server.uri())
        .env("DIRECTUS_TOKEN", "test-token")
        .arg("create")
        .arg(&definition)
        .arg("--media-map")
        .arg(&media)
        .assert()
        .success()
        .stdout(predicate::str::contains("Community Portal"))
        .stdout(predicate::str::contains("Created work order wo-1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_priority_is_warned_about() {
    let server = MockServer::start().await;
    mount_user_lookup(&server).await;

    let temp_dir = tempdir().unwrap();
    let definition = leak_definition(temp_dir.path(), "critical");
    let media = media_map(temp_dir.path());

    workorder_cmd(temp_dir.path())
        .arg("--directus-url")
        .arg(server.uri())
        .arg("--token")
        .arg("test-token")
        .arg("create")
        .arg(&definition)
        .arg("--media-map")
        .arg(&media)
        .arg("--dry-run")
        .assert()
        .success()
        .stderr(predicate::str::contains("Unrecognized priority 'critical'"))
        .stdout(predicate::str::contains("\"priority\": \"critical\"").not());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_preflight_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/server/info"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errors": [{ "message": "Invalid user credentials." }]
        })))
        .mount(&server)
        .await;

    let temp_dir = tempdir().unwrap();
    let definition = leak_definition(temp_dir.path(), "high");
    let media = media_map(temp_dir.path());

    workorder_cmd(temp_dir.path())
        .arg("--directus-url")
        .arg(server.uri())
        .arg("--token")
        .arg("bad-token")
        .arg("create")
        .arg(&definition)
        .arg("--media-map")
        .arg(&media)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not connect to Directus"))
        .stderr(predicate::str::contains("Invalid user credentials."));
}

#[test]
fn test_missing_token_is_fatal() {
    let temp_dir = tempdir().unwrap();
    let definition = leak_definition(temp_dir.path(), "high");

    workorder_cmd(temp_dir.path())
        .arg("create")
        .arg(&definition)
        .arg("--dry-run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DIRECTUS_TOKEN is missing"));
}

#[test]
fn test_missing_definition_file_is_fatal() {
    let temp_dir = tempdir().unwrap();

    workorder_cmd(temp_dir.path())
        .arg("--token")
        .arg("test-token")
        .arg("create")
        .arg("a/non/existent/workorders.json")
        .arg("--dry-run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Create failed"))
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_empty_definition_is_a_warning() {
    let temp_dir = tempdir().unwrap();
    let definition = create_fixture_file(temp_dir.path(), "empty.json", r#"{"items": []}"#);

    workorder_cmd(temp_dir.path())
        .arg("--token")
        .arg("test-token")
        .arg("create")
        .arg(&definition)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("No work orders found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cleanup_declined_deletes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "keep-me" }, { "id": "orphan-1" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let temp_dir = tempdir().unwrap();
    let used = create_fixture_file(temp_dir.path(), "used.txt", "keep-me\n");

    workorder_cmd(temp_dir.path())
        .arg("--directus-url")
        .arg(server.uri())
        .arg("--token")
        .arg("test-token")
        .arg("cleanup")
        .arg("--used-ids")
        .arg(&used)
        .write_stdin("no\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("orphan-1"))
        .stdout(predicate::str::contains("Deletion cancelled"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cleanup_confirmed_deletes_orphans() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "keep-me" }, { "id": "orphan-1" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/files/orphan-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = tempdir().unwrap();
    let used = create_fixture_file(temp_dir.path(), "used.txt", "keep-me\n");

    workorder_cmd(temp_dir.path())
        .arg("--directus-url")
        .arg(server.uri())
        .arg("--token")
        .arg("test-token")
        .arg("cleanup")
        .arg("--used-ids")
        .arg(&used)
        .write_stdin("yes\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 files, 0 failed"));
}
