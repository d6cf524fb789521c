//! In-process stand-in for the emojify service, used by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::config::{AppConfig, LoadConfig, OutputConfig, TargetConfig, WorkflowConfig};
use crate::service::ServiceClient;

/// How the mock answers each endpoint.
#[derive(Clone)]
pub struct Behavior {
    /// Asset paths that answer 404.
    pub failing_assets: Vec<String>,
    pub submit_status: StatusCode,
    pub submit_body: String,
    /// Status values returned in order; the last one repeats.
    pub statuses: Vec<&'static str>,
    /// Raw status body sent instead of the JSON document.
    pub status_body: Option<String>,
    pub status_code: StatusCode,
    pub artifact_status: StatusCode,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            failing_assets: Vec::new(),
            submit_status: StatusCode::OK,
            submit_body: r#"{"id":"job-42"}"#.to_string(),
            statuses: vec!["PROCESSING", "PROCESSING", "FINISHED"],
            status_body: None,
            status_code: StatusCode::OK,
            artifact_status: StatusCode::OK,
        }
    }
}

#[derive(Default)]
pub struct Hits {
    pub assets: AtomicUsize,
    pub submit: AtomicUsize,
    pub status: AtomicUsize,
    pub artifact: AtomicUsize,
}

impl Hits {
    pub fn assets(&self) -> usize {
        self.assets.load(Ordering::SeqCst)
    }

    pub fn submit(&self) -> usize {
        self.submit.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> usize {
        self.status.load(Ordering::SeqCst)
    }

    pub fn artifact(&self) -> usize {
        self.artifact.load(Ordering::SeqCst)
    }
}

struct MockState {
    behavior: Behavior,
    hits: Arc<Hits>,
    submissions: Arc<Mutex<Vec<(Option<String>, String)>>>,
    artifact_ids: Arc<Mutex<Vec<String>>>,
}

pub struct MockService {
    pub base_uri: String,
    pub hits: Arc<Hits>,
    /// `(content-type, body)` of every submission received.
    pub submissions: Arc<Mutex<Vec<(Option<String>, String)>>>,
    pub artifact_ids: Arc<Mutex<Vec<String>>>,
}

impl MockService {
    pub async fn start(behavior: Behavior) -> Self {
        let hits = Arc::new(Hits::default());
        let submissions = Arc::new(Mutex::new(Vec::new()));
        let artifact_ids = Arc::new(Mutex::new(Vec::new()));
        let state = Arc::new(MockState {
            behavior,
            hits: Arc::clone(&hits),
            submissions: Arc::clone(&submissions),
            artifact_ids: Arc::clone(&artifact_ids),
        });

        let app = Router::new()
            .route("/v2/api/emojify/", post(submit))
            .route("/v2/api/emojify/:id", get(status))
            .route("/v2/api/cache/:id", get(artifact))
            .fallback(asset)
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_uri: format!("http://{addr}"),
            hits,
            submissions,
            artifact_ids,
        }
    }

    pub fn client(&self) -> ServiceClient {
        ServiceClient::new(&self.base_uri, Duration::from_secs(5)).unwrap()
    }

    pub fn config(&self) -> AppConfig {
        config_for(&self.base_uri)
    }
}

/// Configuration with short delays so tests run quickly.
pub fn config_for(base_uri: &str) -> AppConfig {
    AppConfig {
        target: TargetConfig {
            base_uri: base_uri.to_string(),
            request_timeout_secs: 5,
        },
        load: LoadConfig::default(),
        workflow: WorkflowConfig {
            settle_delay_ms: 0,
            poll_interval_ms: 10,
            max_poll_attempts: 5,
            ..WorkflowConfig::default()
        },
        output: OutputConfig::default(),
    }
}

/// A base URI nothing is listening on.
pub async fn unreachable_base_uri() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn asset(State(state): State<Arc<MockState>>, uri: Uri) -> StatusCode {
    state.hits.assets.fetch_add(1, Ordering::SeqCst);
    if state.behavior.failing_assets.iter().any(|p| p == uri.path()) {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    }
}

async fn submit(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    state.hits.submit.fetch_add(1, Ordering::SeqCst);
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.submissions.lock().unwrap().push((content_type, body));
    (state.behavior.submit_status, state.behavior.submit_body.clone())
}

async fn status(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    let n = state.hits.status.fetch_add(1, Ordering::SeqCst);
    let code = state.behavior.status_code;
    if let Some(body) = &state.behavior.status_body {
        return (code, body.clone()).into_response();
    }

    let statuses = &state.behavior.statuses;
    let current = statuses[n.min(statuses.len() - 1)];
    (code, Json(json!({ "id": id, "status": current }))).into_response()
}

async fn artifact(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> StatusCode {
    state.hits.artifact.fetch_add(1, Ordering::SeqCst);
    state.artifact_ids.lock().unwrap().push(id);
    state.behavior.artifact_status
}
