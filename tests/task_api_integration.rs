//! Integration tests for the task REST API with a live worker pool.
//!
//! Each test spins up an Axum server on a random port backed by a real
//! in-memory repository and worker pool, then drives it over HTTP.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use task_pool::api::task_routes;
use task_pool::handlers::builtin::{EchoHandler, FailHandler};
use task_pool::handlers::{Handler, HandlerContext, HandlerError, HandlerRegistry};
use task_pool::tasks::{InMemoryTaskRepository, TaskRepository, TaskService, TaskStatus};
use task_pool::worker::{WorkerConfig, WorkerPool};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fails on its first call, succeeds afterwards.
struct FlakyHandler {
    calls: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl Handler for FlakyHandler {
    fn name(&self) -> &str {
        "flaky"
    }
    async fn execute(&self, payload: &str, _ctx: &HandlerContext) -> Result<String, HandlerError> {
        let n = self
            .calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if n == 0 {
            Err(HandlerError::Failed {
                handler: "flaky".to_string(),
                reason: "first attempt".to_string(),
            })
        } else {
            Ok(format!("{payload}#{n}"))
        }
    }
}

/// Echoes the payload and records how often each payload was executed.
#[derive(Default)]
struct CountingHandler {
    runs: Mutex<HashMap<String, usize>>,
}

impl CountingHandler {
    fn runs(&self) -> HashMap<String, usize> {
        self.runs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Handler for CountingHandler {
    fn name(&self) -> &str {
        "count"
    }
    async fn execute(&self, payload: &str, _ctx: &HandlerContext) -> Result<String, HandlerError> {
        *self.runs.lock().unwrap().entry(payload.to_string()).or_default() += 1;
        tokio::task::yield_now().await;
        Ok(payload.to_string())
    }
}

struct TestServer {
    base: String,
    client: reqwest::Client,
    repo: Arc<InMemoryTaskRepository>,
    counter: Arc<CountingHandler>,
    pool: WorkerPool,
}

/// Start an Axum server on a random port with `workers` polling loops.
async fn start_server(workers: usize) -> TestServer {
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(EchoHandler)).unwrap();
    registry.register(Arc::new(FailHandler)).unwrap();
    registry
        .register(Arc::new(FlakyHandler {
            calls: Default::default(),
        }))
        .unwrap();
    let counter = Arc::new(CountingHandler::default());
    registry.register(counter.clone()).unwrap();

    let repo = InMemoryTaskRepository::new();
    let pool = WorkerPool::spawn(
        &WorkerConfig {
            worker_count: workers,
            poll_interval: Duration::from_millis(10),
        },
        repo.clone(),
        CancellationToken::new(),
    );

    let app = task_routes(TaskService::new(repo.clone(), Arc::new(registry)));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        base: format!("http://127.0.0.1:{port}"),
        client: reqwest::Client::new(),
        repo,
        counter,
        pool,
    }
}

impl TestServer {
    async fn create(&self, name: &str, payload: &str) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(format!("{}/tasks", self.base))
            .json(&json!({"name": name, "payload": payload}))
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, id: &str) -> (StatusCode, Value) {
        let resp = self
            .client
            .get(format!("{}/tasks/{id}", self.base))
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn retry(&self, id: &str) -> (StatusCode, Value) {
        let resp = self
            .client
            .patch(format!("{}/tasks/{id}/retry", self.base))
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    /// Poll `GET /tasks/{id}` until the task reports `status`.
    async fn wait_for_status(&self, id: &str, status: TaskStatus) -> Value {
        loop {
            let (code, json) = self.get(id).await;
            assert_eq!(code, StatusCode::OK);
            if json["status"] == status.code() {
                return json;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[tokio::test]
async fn echo_task_completes() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(2).await;

        let (status, created) = server.create("echo", "hi").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], TaskStatus::Created.code());
        let id = created["id"].as_str().unwrap().to_string();

        let done = server.wait_for_status(&id, TaskStatus::Completed).await;
        assert_eq!(done["result"], "hi");
        assert!(done["taken_at"].is_string());
        assert!(done["completed_at"].is_string());
        assert!(done["processing_duration"].is_string());

        server.pool.shutdown().await;
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn failing_task_can_be_retried() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(2).await;

        let (_, created) = server.create("flaky", "job").await;
        let id = created["id"].as_str().unwrap().to_string();

        let failed = server.wait_for_status(&id, TaskStatus::Failed).await;
        assert_eq!(failed["result"], "");
        assert!(failed["completed_at"].is_null());

        let (status, retried) = server.retry(&id).await;
        assert_eq!(status, StatusCode::OK);
        // a worker may already have reclaimed it
        assert_ne!(retried["status"], TaskStatus::Failed.code());

        let done = server.wait_for_status(&id, TaskStatus::Completed).await;
        assert_eq!(done["result"], "job#1");

        server.pool.shutdown().await;
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn fail_handler_stays_failed() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(1).await;

        let (_, created) = server.create("fail", "x").await;
        let id = created["id"].as_str().unwrap().to_string();

        let failed = server.wait_for_status(&id, TaskStatus::Failed).await;
        assert_eq!(failed["result"], "");
        assert_eq!(failed["processing_duration"], "0s");

        server.pool.shutdown().await;
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn retry_of_completed_task_is_noop() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(1).await;

        let (_, created) = server.create("echo", "once").await;
        let id = created["id"].as_str().unwrap().to_string();
        let done = server.wait_for_status(&id, TaskStatus::Completed).await;

        let (status, retried) = server.retry(&id).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(retried, done);

        server.pool.shutdown().await;
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unknown_handler_is_rejected() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(1).await;

        let (status, body) = server.create("does-not-exist", "x").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("does-not-exist"));
        assert_eq!(server.repo.len().await.unwrap(), 0);

        server.pool.shutdown().await;
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn delete_removes_task() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(1).await;

        let (_, created) = server.create("echo", "bye").await;
        let id = created["id"].as_str().unwrap().to_string();
        server.wait_for_status(&id, TaskStatus::Completed).await;

        let resp = server
            .client
            .delete(format!("{}/tasks/{id}", server.base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let (status, _) = server.get(&id).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        server.pool.shutdown().await;
    })
    .await
    .expect("test timed out");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_tasks_each_run_once() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(8).await;

        let mut ids = Vec::new();
        for i in 0..50 {
            let (status, created) = server.create("count", &format!("p{i}")).await;
            assert_eq!(status, StatusCode::CREATED);
            ids.push((created["id"].as_str().unwrap().to_string(), format!("p{i}")));
        }

        for (id, payload) in &ids {
            let done = server.wait_for_status(id, TaskStatus::Completed).await;
            assert_eq!(done["result"], payload.as_str());
        }

        // stop the loops so no late claim can slip in before counting
        server.pool.shutdown().await;

        let runs = server.counter.runs();
        assert_eq!(runs.len(), ids.len());
        for (_, payload) in &ids {
            assert_eq!(runs.get(payload), Some(&1), "payload {payload} run count");
        }
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(1).await;

        let resp = server
            .client
            .get(format!("{}/health", server.base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["status"], "ok");

        server.pool.shutdown().await;
    })
    .await
    .expect("test timed out");
}
