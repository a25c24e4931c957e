#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tempfile::TempDir;

/// Path of the compiled `directory` binary.
pub fn directory_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_directory"))
}

/// Helper struct to run directory commands in an isolated temp directory
pub struct DirectoryTest {
    pub temp_dir: TempDir,
    envs: Vec<(String, String)>,
}

impl DirectoryTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        DirectoryTest {
            temp_dir,
            envs: Vec::new(),
        }
    }

    /// Set an environment variable for every command run by this helper.
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn run(&self, args: &[&str]) -> Output {
        let mut command = Command::new(directory_binary());
        command
            .args(args)
            .current_dir(self.temp_dir.path())
            .env_remove("DIRECTORY_ROOT")
            .env_remove("DIRECTORY_API_URL")
            .env_remove("DIRECTORY_TOKEN")
            .env_remove("DIRECTORY_LOG")
            .env("NO_COLOR", "1");
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        command.output().expect("Failed to execute directory command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join(".directory").join("config.yaml")
    }

    pub fn read_config(&self) -> String {
        std::fs::read_to_string(self.config_path()).expect("Failed to read config file")
    }
}

/// Stub of the Directory backend.
///
/// - `/v1/members`: envelope body with `totalItems`, filterable by `region`
/// - `/v1/teams`: bare array with an `X-Total-Count` header
/// - `/v1/projects`: bare array without any total
/// - `/v1/events`: always 404
#[derive(Clone, Default)]
pub struct Backend {
    requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl Backend {
    /// Query parameters of every request received so far.
    pub fn requests(&self) -> Vec<HashMap<String, String>> {
        self.requests.lock().expect("requests lock").clone()
    }

    fn record(&self, query: &HashMap<String, String>) {
        self.requests.lock().expect("requests lock").push(query.clone());
    }
}

pub fn member(id: u64) -> Value {
    let region = if id % 2 == 0 { "us" } else { "eu" };
    json!({ "id": id, "name": format!("Member {id}"), "region": region })
}

/// Members 1..=45; `region` filters them.
fn members_matching(query: &HashMap<String, String>) -> Vec<Value> {
    (1..=45)
        .map(member)
        .filter(|m| match query.get("region") {
            Some(region) => m["region"] == region.as_str(),
            None => true,
        })
        .collect()
}

fn paginate(items: Vec<Value>, query: &HashMap<String, String>) -> (Vec<Value>, usize) {
    let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let limit: usize = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(20);
    let total = items.len();
    let page_items = items
        .into_iter()
        .skip((page.max(1) - 1) * limit)
        .take(limit)
        .collect();
    (page_items, total)
}

async fn members(
    State(backend): State<Backend>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    backend.record(&query);
    let (items, total) = paginate(members_matching(&query), &query);
    Json(json!({ "items": items, "totalItems": total }))
}

async fn teams(
    State(backend): State<Backend>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    backend.record(&query);
    let teams: Vec<Value> = (1..=3)
        .map(|id| json!({ "id": id, "name": format!("Team {id}") }))
        .collect();
    let (items, total) = paginate(teams, &query);
    ([("x-total-count", total.to_string())], Json(items))
}

async fn projects(
    State(backend): State<Backend>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    backend.record(&query);
    Json(json!([{ "id": 1, "name": "Project 1" }]))
}

async fn events(
    State(backend): State<Backend>,
    Query(query): Query<HashMap<String, String>>,
) -> StatusCode {
    backend.record(&query);
    StatusCode::NOT_FOUND
}

/// Serve the stub on an ephemeral port. Returns its API base URL.
pub async fn spawn_backend(backend: Backend) -> String {
    let app = Router::new()
        .route("/v1/members", get(members))
        .route("/v1/teams", get(teams))
        .route("/v1/projects", get(projects))
        .route("/v1/events", get(events))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr: SocketAddr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    format!("http://{addr}/v1")
}
