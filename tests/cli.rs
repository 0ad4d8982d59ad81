//! Process-level tests for the two binaries
//!
//! Most cases fail before any credential lookup or network call; the
//! dry-run cases talk to a local mock server.

use serde_json::json;
use std::process::{Command, Output};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn clean_cloud(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_clean-cloud"))
        .args(args)
        .env_remove("PROJECT_ID")
        .env_remove("AZURE_SUBSCRIPTION_ID")
        .env_remove("RUST_LOG")
        .output()
        .expect("run clean-cloud")
}

#[test]
fn gcp_list_without_project_id_exits_nonzero() {
    let output = clean_cloud(&["gcp", "list"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("PROJECT_ID is not set"), "stderr: {stderr}");
}

#[test]
fn azure_clean_without_subscription_exits_nonzero() {
    let output = clean_cloud(&["azure", "clean", "--yes"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("AZURE_SUBSCRIPTION_ID is not set"),
        "stderr: {stderr}"
    );
}

#[test]
fn empty_project_id_counts_as_missing() {
    let output = Command::new(env!("CARGO_BIN_EXE_clean-cloud"))
        .args(["gcp", "list"])
        .env("PROJECT_ID", "")
        .output()
        .expect("run clean-cloud");
    assert!(!output.status.success());
}

#[test]
fn missing_subcommand_is_usage_error() {
    let output = clean_cloud(&["gcp"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn clean_gcp_with_malformed_config_logs_and_refuses() {
    let home = tempfile::tempdir().expect("tempdir");
    let config_dir = home.path().join(".config");
    std::fs::create_dir_all(&config_dir).expect("config dir");
    std::fs::write(config_dir.join("clean_cloud.json"), "{ project_id: ").expect("write config");

    let output = Command::new(env!("CARGO_BIN_EXE_clean-gcp"))
        .env("HOME", home.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("run clean-gcp");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to parse config"), "stderr: {stderr}");
    assert!(stderr.contains("no project id configured"), "stderr: {stderr}");
    assert!(!stderr.contains("panicked"), "stderr: {stderr}");
}

#[test]
fn clean_gcp_without_config_file_refuses() {
    let home = tempfile::tempdir().expect("tempdir");

    let output = Command::new(env!("CARGO_BIN_EXE_clean-gcp"))
        .env("HOME", home.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("run clean-gcp");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read config"), "stderr: {stderr}");
}

async fn dry_run(args: &[&str], envs: &[(&str, String)]) -> std::process::Output {
    let mut command = tokio::process::Command::new(env!("CARGO_BIN_EXE_clean-cloud"));
    command
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("AZURE_TENANT_ID")
        .env_remove("AZURE_CLIENT_ID")
        .env_remove("AZURE_CLIENT_SECRET");
    for (key, value) in envs {
        command.env(key, value);
    }
    command.output().await.expect("run clean-cloud")
}

#[tokio::test]
async fn gcp_clean_without_yes_deletes_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/compute/v1/projects/proj-1/aggregated/instances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": {
                "zones/us-central1-a": {
                    "instances": [{"name": "vm-1", "zone": "zones/us-central1-a"}]
                }
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = dry_run(
        &["gcp", "clean"],
        &[
            ("PROJECT_ID", "proj-1".to_string()),
            ("GOOGLE_OAUTH_ACCESS_TOKEN", "test-token".to_string()),
            ("GCP_COMPUTE_ENDPOINT", server.uri()),
        ],
    )
    .await;

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Would delete:"), "stdout: {stdout}");
    assert!(stdout.contains("vm-1"), "stdout: {stdout}");
}

#[tokio::test]
async fn azure_clean_without_yes_deletes_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/subscriptions/sub-1/resourcegroups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "/subscriptions/sub-1/resourceGroups/rg-1", "name": "rg-1", "location": "westeurope"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = dry_run(
        &["azure", "clean"],
        &[
            ("AZURE_SUBSCRIPTION_ID", "sub-1".to_string()),
            ("AZURE_ACCESS_TOKEN", "test-token".to_string()),
            ("AZURE_RESOURCE_MANAGER_ENDPOINT", server.uri()),
        ],
    )
    .await;

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Would delete:"), "stdout: {stdout}");
    assert!(stdout.contains("rg-1"), "stdout: {stdout}");
}
