//! Mock fal queue backend for integration tests
//!
//! Each job reports `IN_QUEUE`, then `IN_PROGRESS` with one log line, then
//! `COMPLETED`; the result echoes the prompt back.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Application id the default model is queued under
const APP: &str = "fal-ai/flux";

/// How the mock answers
#[derive(Clone)]
enum Behavior {
    Succeed,
    /// Reject every submission with `status` and a `detail` body
    Reject { status: StatusCode, detail: String },
    /// Complete every job with an error field
    FailJob(String),
    /// Keep every job in progress forever
    Stall,
}

/// Mock fal queue that tracks what the relay sent it
pub struct MockFal {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockFalState>,
}

struct MockFalState {
    base_url: String,
    behavior: Behavior,
    next_id: AtomicU32,
    submit_count: AtomicU32,
    poll_count: AtomicU32,
    result_count: AtomicU32,
    authorization: Mutex<Option<String>>,
    input: Mutex<Option<Value>>,
    jobs: Mutex<HashMap<String, Job>>,
}

struct Job {
    prompt: Value,
    polls: u32,
}

impl MockFal {
    /// Start a mock that completes every job
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(Behavior::Succeed).await
    }

    /// Start a mock that rejects submissions
    pub async fn start_rejecting(status: StatusCode, detail: &str) -> anyhow::Result<Self> {
        Self::start_inner(Behavior::Reject {
            status,
            detail: detail.to_owned(),
        })
        .await
    }

    /// Start a mock whose jobs complete with `error`
    pub async fn start_failing_jobs(error: &str) -> anyhow::Result<Self> {
        Self::start_inner(Behavior::FailJob(error.to_owned())).await
    }

    /// Start a mock whose jobs never finish
    pub async fn start_stalled() -> anyhow::Result<Self> {
        Self::start_inner(Behavior::Stall).await
    }

    async fn start_inner(behavior: Behavior) -> anyhow::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(MockFalState {
            base_url: format!("http://{addr}"),
            behavior,
            next_id: AtomicU32::new(1),
            submit_count: AtomicU32::new(0),
            poll_count: AtomicU32::new(0),
            result_count: AtomicU32::new(0),
            authorization: Mutex::new(None),
            input: Mutex::new(None),
            jobs: Mutex::new(HashMap::new()),
        });

        let app = Router::new()
            .route(&format!("/{APP}/dev"), routing::post(handle_submit))
            .route(&format!("/{APP}/requests/{{id}}/status"), routing::get(handle_status))
            .route(&format!("/{APP}/requests/{{id}}"), routing::get(handle_result))
            .with_state(Arc::clone(&state));

        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Queue base URL for configuring the relay
    pub fn queue_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of job submissions received
    pub fn submit_count(&self) -> u32 {
        self.state.submit_count.load(Ordering::Relaxed)
    }

    /// Number of status polls received
    pub fn poll_count(&self) -> u32 {
        self.state.poll_count.load(Ordering::Relaxed)
    }

    /// Number of result fetches received
    pub fn result_count(&self) -> u32 {
        self.state.result_count.load(Ordering::Relaxed)
    }

    /// `Authorization` header of the most recent submission
    pub fn last_authorization(&self) -> Option<String> {
        self.state.authorization.lock().unwrap().clone()
    }

    /// Input body of the most recent submission
    pub fn last_input(&self) -> Option<Value> {
        self.state.input.lock().unwrap().clone()
    }
}

impl Drop for MockFal {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Request not found" }))).into_response()
}

async fn handle_submit(
    State(state): State<Arc<MockFalState>>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> Response {
    state.submit_count.fetch_add(1, Ordering::Relaxed);
    *state.authorization.lock().unwrap() = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    *state.input.lock().unwrap() = Some(input.clone());

    if let Behavior::Reject { status, detail } = &state.behavior {
        return (*status, Json(json!({ "detail": detail }))).into_response();
    }

    let id = format!("req-{}", state.next_id.fetch_add(1, Ordering::Relaxed));
    state.jobs.lock().unwrap().insert(
        id.clone(),
        Job {
            prompt: input["prompt"].clone(),
            polls: 0,
        },
    );

    let request_url = format!("{}/{APP}/requests/{id}", state.base_url);
    Json(json!({
        "request_id": id,
        "status_url": format!("{request_url}/status"),
        "response_url": request_url,
    }))
    .into_response()
}

async fn handle_status(State(state): State<Arc<MockFalState>>, Path(id): Path<String>) -> Response {
    state.poll_count.fetch_add(1, Ordering::Relaxed);

    let mut jobs = state.jobs.lock().unwrap();
    let Some(job) = jobs.get_mut(&id) else {
        return not_found();
    };
    job.polls += 1;

    let body = match (&state.behavior, job.polls) {
        (_, 1) => json!({ "status": "IN_QUEUE", "queue_position": 0 }),
        (Behavior::Stall, _) | (_, 2) => json!({
            "status": "IN_PROGRESS",
            "logs": [{ "message": format!("rendering {}", job.prompt), "level": "INFO" }],
        }),
        (Behavior::FailJob(error), _) => json!({ "status": "COMPLETED", "error": error }),
        _ => json!({ "status": "COMPLETED", "logs": [] }),
    };

    Json(body).into_response()
}

async fn handle_result(State(state): State<Arc<MockFalState>>, Path(id): Path<String>) -> Response {
    state.result_count.fetch_add(1, Ordering::Relaxed);

    let jobs = state.jobs.lock().unwrap();
    let Some(job) = jobs.get(&id) else {
        return not_found();
    };

    Json(json!({
        "images": [{ "url": format!("https://img.test/{id}.png"), "width": 1024, "height": 768 }],
        "prompt": job.prompt,
    }))
    .into_response()
}
