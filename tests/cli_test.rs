mod common;

use common::{Backend, DirectoryTest, spawn_backend};
use serde_json::Value;

fn parse_json(output: &str) -> Value {
    serde_json::from_str(output).expect("valid JSON output")
}

// ============================================================================
// params
// ============================================================================

#[test]
fn test_params_encode_joins_values_with_separator() {
    let directory = DirectoryTest::new();
    let output = directory.run_success(&[
        "params", "encode", "tag=ai,ml", "region=us",
    ]);
    assert_eq!(output.trim(), "region=us&tag=ai%E2%90%9Fml");
}

#[test]
fn test_params_decode_splits_values() {
    let directory = DirectoryTest::new();
    let output = directory.run_success(&[
        "params",
        "decode",
        "?region=us&tag=ai%E2%90%9Fml",
        "--json",
    ]);
    let json = parse_json(&output);
    assert_eq!(json["filters"]["region"], serde_json::json!(["us"]));
    assert_eq!(json["filters"]["tag"], serde_json::json!(["ai", "ml"]));
}

#[test]
fn test_params_decode_drops_empty_values() {
    let directory = DirectoryTest::new();
    let output = directory.run_success(&["params", "decode", "region=&tag=ai", "--json"]);
    let json = parse_json(&output);
    assert!(json["filters"].get("region").is_none());
    assert_eq!(json["query"], "tag=ai");
}

#[test]
fn test_params_decode_rejects_malformed_escape() {
    let directory = DirectoryTest::new();
    let stderr = directory.run_failure(&["params", "decode", "region=%zz"]);
    assert!(stderr.contains("invalid query string"), "stderr: {stderr}");
}

// ============================================================================
// config
// ============================================================================

#[test]
fn test_config_show_empty() {
    let directory = DirectoryTest::new();
    let output = directory.run_success(&["config", "show"]);
    assert!(output.contains("Configuration"));
    assert!(output.contains("not configured"));
    assert!(output.contains("page_size"));
}

#[test]
fn test_config_set_and_show() {
    let directory = DirectoryTest::new();
    directory.run_success(&["config", "set", "api_url", "https://api.directory.example/v1"]);
    directory.run_success(&["config", "set", "page_size", "50"]);

    let output = directory.run_success(&["config", "show", "--json"]);
    let json = parse_json(&output);
    assert_eq!(json["api_url"], "https://api.directory.example/v1");
    assert_eq!(json["page_size"], 50);
    assert_eq!(json["auth"]["token_configured"], false);
}

#[test]
fn test_config_token_is_masked() {
    let directory = DirectoryTest::new();
    let output = directory.run_success(&["config", "set", "auth.token", "tok_supersecret"]);
    assert!(!output.contains("supersecret"));

    let output = directory.run_success(&["config", "show"]);
    assert!(!output.contains("supersecret"));
    assert!(output.contains("to...et"));
    assert!(directory.read_config().contains("tok_supersecret"));
}

#[cfg(unix)]
#[test]
fn test_config_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let directory = DirectoryTest::new();
    directory.run_success(&["config", "set", "auth.token", "tok_supersecret"]);
    let mode = std::fs::metadata(directory.config_path())
        .expect("config metadata")
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_config_set_invalid_key() {
    let directory = DirectoryTest::new();
    let stderr = directory.run_failure(&["config", "set", "colour", "blue"]);
    assert!(stderr.contains("unknown config key"));
}

#[test]
fn test_config_set_invalid_page_size() {
    let directory = DirectoryTest::new();
    let stderr = directory.run_failure(&["config", "set", "page_size", "0"]);
    assert!(stderr.contains("page_size"));
}

#[test]
fn test_config_root_env_override() {
    let directory = DirectoryTest::new();
    let root = directory.temp_dir.path().join("elsewhere");
    let directory = directory.with_env("DIRECTORY_ROOT", root.to_str().expect("utf-8 path"));
    directory.run_success(&["config", "set", "page_size", "7"]);
    assert!(root.join("config.yaml").exists());
    assert!(!directory.config_path().exists());
}

// ============================================================================
// browse
// ============================================================================

#[test]
fn test_browse_without_api_url_fails() {
    let directory = DirectoryTest::new();
    let stderr = directory.run_failure(&["browse", "members"]);
    assert!(stderr.contains("no API URL configured"), "stderr: {stderr}");
}

#[test]
fn test_browse_unknown_resource_fails() {
    let directory = DirectoryTest::new();
    let stderr = directory.run_failure(&["browse", "forum"]);
    assert!(stderr.contains("invalid resource"));
}

async fn browse(directory: DirectoryTest, args: &'static [&'static str]) -> std::process::Output {
    tokio::task::spawn_blocking(move || directory.run(args))
        .await
        .expect("browse task")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_browse_loads_pages_through_scrolling() {
    let backend = Backend::default();
    let api_url = spawn_backend(backend.clone()).await;
    let directory = DirectoryTest::new().with_env("DIRECTORY_API_URL", &api_url);

    let output = browse(
        directory,
        &["browse", "members", "--limit", "10", "--pages", "3", "--json"],
    )
    .await;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json = parse_json(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(json["page"], 3);
    assert_eq!(json["loaded_item_count"], 30);
    assert_eq!(json["total_items"], 45);
    assert_eq!(json["items"].as_array().map(Vec::len), Some(30));

    let pages: Vec<String> = backend.requests().iter().map(|q| q["page"].clone()).collect();
    assert_eq!(pages, vec!["1", "2", "3"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_browse_hydrates_filters_from_url() {
    let backend = Backend::default();
    let api_url = spawn_backend(backend.clone()).await;
    let directory = DirectoryTest::new().with_env("DIRECTORY_API_URL", &api_url);

    let output = browse(
        directory,
        &[
            "browse",
            "members",
            "--url",
            "https://directory.example/members?region=us&tag=ai%E2%90%9Fml",
            "--limit",
            "20",
            "--pages",
            "5",
            "--json",
        ],
    )
    .await;
    assert!(output.status.success());
    let json = parse_json(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(json["filters"]["tag"], serde_json::json!(["ai", "ml"]));
    assert_eq!(json["total_items"], 22);
    // Everything loaded: no request past the last page.
    assert_eq!(json["loaded_item_count"], 22);

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|q| q["region"] == "us"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_browse_reports_http_errors() {
    let api_url = spawn_backend(Backend::default()).await;
    let directory = DirectoryTest::new().with_env("DIRECTORY_API_URL", &api_url);

    let output = browse(directory, &["browse", "events"]).await;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("404"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_browse_json_classifies_errors() {
    let api_url = spawn_backend(Backend::default()).await;
    let directory = DirectoryTest::new().with_env("DIRECTORY_API_URL", &api_url);

    let output = browse(directory, &["browse", "events", "--json"]).await;
    assert!(!output.status.success());
    let json = parse_json(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(json["error"]["status"], 404);
    assert_eq!(json["error"]["transient"], false);
    assert_eq!(json["loaded_item_count"], 0);
}

// ============================================================================
// completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let directory = DirectoryTest::new();
    let output = directory.run_success(&["completions", "bash"]);
    assert!(output.contains("_directory"));
}

#[test]
fn test_completions_zsh() {
    let directory = DirectoryTest::new();
    let output = directory.run_success(&["completions", "zsh"]);
    assert!(output.contains("#compdef directory"));
}
