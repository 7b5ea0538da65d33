//! Runs the api-comparator binary against local axum servers

use std::path::Path;
use std::process::Output;

use axum::extract::Path as UrlPath;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::process::Command;

/// Serve a user API whose `ts` field differs per host
async fn spawn_host(ts: u64) -> String {
    let app = Router::new().route(
        "/users/:id",
        get(move |UrlPath(id): UrlPath<u64>| async move {
            Json(json!({"id": id, "name": "alice", "roles": ["admin", "dev"], "ts": ts}))
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn suite_yaml(primary: &str, secondary: &str, expected_id: u64) -> String {
    format!(
        r#"
config:
  base_url: "{primary}"
  base_url_comparison: "{secondary}"
  timeout: 5
  headers:
    Accept: application/json
  variables:
    user_id: 7

tests:
  - name: Get user
    request:
      method: GET
      path: "/users/{{{{user_id}}}}"
    expected:
      status_code: 200
      headers:
        Content-Type: json
      body:
        exact:
          id: {expected_id}
  - name: Disabled
    enabled: false
    request:
      method: GET
      path: /nowhere

comparisons:
  - name: Users match across hosts
    request:
      method: GET
      path: "/users/{{{{user_id}}}}"
    validation:
      ignore_fields: ["ts"]

report:
  verbose: true
  output_file: results.json
  comparison_report: report.html
"#
    )
}

async fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_api-comparator"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_passing_suite_writes_reports() {
    let primary = spawn_host(100).await;
    let secondary = spawn_host(200).await;
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("suite.yaml"), suite_yaml(&primary, &secondary, 7)).unwrap();

    let output = run(dir.path(), &["-c", "suite.yaml"]).await;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stdout:\n{}", stdout);
    assert!(stdout.contains("✅ Get user - PASS"));
    assert!(stdout.contains("⏭️  Disabled - DISABLED"));
    assert!(stdout.contains("✅ Users match across hosts - IDENTICAL"));

    let results: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("results.json")).unwrap())
            .unwrap();
    assert_eq!(results["summary"]["tests"]["success"], 1);
    assert_eq!(results["summary"]["tests"]["skipped"], 1);
    assert_eq!(results["summary"]["comparisons"]["identical"], 1);
    assert_eq!(results["config"]["config_file"], "suite.yaml");

    let html = std::fs::read_to_string(dir.path().join("report.html")).unwrap();
    assert!(html.contains("Users match across hosts"));
}

#[tokio::test]
async fn test_failing_suite_exits_non_zero() {
    let primary = spawn_host(100).await;
    let secondary = spawn_host(100).await;
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("suite.yaml"), suite_yaml(&primary, &secondary, 8)).unwrap();

    let output = run(dir.path(), &["--config", "suite.yaml", "--no-save"]).await;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(!output.status.success());
    assert!(stdout.contains("❌ Get user - FAIL (status: 200)"));
    assert!(stdout.contains("Body['id']: 7 (expected: 8)"));
    assert!(!dir.path().join("results.json").exists());
}

#[tokio::test]
async fn test_missing_suite_is_fatal() {
    let dir = tempfile::TempDir::new().unwrap();

    let output = run(dir.path(), &["-c", "missing.yaml"]).await;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load suite missing.yaml"), "{}", stderr);
}
