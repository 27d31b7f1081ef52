// tests/lifecycle_tests.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use cbt_admin::api::HttpSync;
use cbt_admin::config::Config;
use cbt_admin::error::AdminError;
use cbt_admin::models::assessment::{RunState, Visibility};
use cbt_admin::view::{DetailView, OpState, Operation};

/// Shared state of the mock API server.
struct MockApi {
    assessment: Mutex<Value>,
    authorize_hits: AtomicUsize,
    end_hits: AtomicUsize,
    patch_hits: AtomicUsize,
    delete_hits: AtomicUsize,
    /// Extra latency injected into the assessment fetch.
    fetch_delay: Duration,
    /// Whether the export endpoint has results prepared.
    export_ready: bool,
}

impl MockApi {
    fn new() -> Self {
        Self {
            assessment: Mutex::new(json!({
                "_id": "a1",
                "title": "CSC301 MID-TERM",
                "course": { "code": "CSC301", "title": "Data Structures" },
                "totalMarks": 60,
                "timeLimit": 45,
                "status": "published",
                "authorizedToStart": false,
                "endReason": null,
                "sections": [],
                "students": []
            })),
            authorize_hits: AtomicUsize::new(0),
            end_hits: AtomicUsize::new(0),
            patch_hits: AtomicUsize::new(0),
            delete_hits: AtomicUsize::new(0),
            fetch_delay: Duration::ZERO,
            export_ready: false,
        }
    }

    /// The assessment as returned by mutation endpoints: the `course`
    /// field is never echoed back.
    async fn mutation_response(&self) -> Value {
        let mut assessment = self.assessment.lock().await.clone();
        assessment.as_object_mut().unwrap().remove("course");
        json!({ "data": assessment })
    }
}

/// Spawns the mock API on a random port and returns a client pointed
/// at it.
async fn spawn_api(api: Arc<MockApi>) -> HttpSync {
    let router = Router::new()
        .route(
            "/school/assessment/{id}",
            get(fetch_assessment)
                .patch(patch_assessment)
                .delete(delete_assessment),
        )
        .route(
            "/school/assessment/{id}/authorize",
            axum::routing::patch(authorize_assessment),
        )
        .route(
            "/school/assessment/{id}/end",
            axum::routing::patch(end_assessment),
        )
        .route("/school/assessment/{id}/export", get(export_results))
        .route("/school/groups", get(fetch_groups))
        .with_state(api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let address = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let config = Config {
        api_base_url: url::Url::parse(&format!("{}/", address)).unwrap(),
        api_token: "test-token".to_string(),
        rust_log: "error".to_string(),
    };

    HttpSync::new(&config).expect("Failed to build client")
}

// The fetch answers 201 on purpose: some API revisions do, and the
// client must accept it like a 200.
async fn fetch_assessment(
    State(api): State<Arc<MockApi>>,
    Path(_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    tokio::time::sleep(api.fetch_delay).await;
    let assessment = api.assessment.lock().await.clone();
    (StatusCode::CREATED, Json(json!({ "data": assessment })))
}

async fn fetch_groups(State(_api): State<Arc<MockApi>>) -> Json<Value> {
    Json(json!({
        "data": {
            "groups": [
                {
                    "_id": "G1",
                    "code": "ENG",
                    "name": "Engineering",
                    "subGroups": [
                        { "_id": "S1", "name": "Mechanical" },
                        { "_id": "S2", "name": "Electrical" }
                    ]
                }
            ]
        }
    }))
}

async fn patch_assessment(
    State(api): State<Arc<MockApi>>,
    Path(_id): Path<String>,
    Json(patch): Json<Value>,
) -> Json<Value> {
    api.patch_hits.fetch_add(1, Ordering::SeqCst);

    {
        let mut assessment = api.assessment.lock().await;
        for (key, value) in patch.as_object().unwrap() {
            // The real API stores schedule dates as full datetimes.
            if key == "startDate" || key == "dueDate" {
                let date = value.as_str().unwrap();
                assessment[key] = json!(format!("{}T00:00:00Z", date));
            } else {
                assessment[key] = value.clone();
            }
        }
    }

    Json(api.mutation_response().await)
}

async fn authorize_assessment(
    State(api): State<Arc<MockApi>>,
    Path(_id): Path<String>,
) -> Json<Value> {
    api.authorize_hits.fetch_add(1, Ordering::SeqCst);

    {
        let mut assessment = api.assessment.lock().await;
        let current = assessment["authorizedToStart"].as_bool().unwrap();
        assessment["authorizedToStart"] = json!(!current);
    }

    Json(api.mutation_response().await)
}

async fn end_assessment(
    State(api): State<Arc<MockApi>>,
    Path(_id): Path<String>,
    body: Option<Json<Value>>,
) -> Json<Value> {
    api.end_hits.fetch_add(1, Ordering::SeqCst);

    {
        let mut assessment = api.assessment.lock().await;
        let reason = body
            .as_ref()
            .and_then(|Json(b)| b["endReason"].as_str())
            .unwrap_or("Ended by system");
        assessment["endReason"] = json!(reason);
    }

    Json(api.mutation_response().await)
}

async fn delete_assessment(
    State(api): State<Arc<MockApi>>,
    Path(_id): Path<String>,
) -> Json<Value> {
    api.delete_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({}))
}

async fn export_results(
    State(api): State<Arc<MockApi>>,
    Path(_id): Path<String>,
) -> Result<Vec<u8>, (StatusCode, Json<Value>)> {
    if !api.export_ready {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "results not ready" })),
        ));
    }
    Ok(b"reg,score\nU123,40\n".to_vec())
}

#[tokio::test]
async fn load_accepts_201_and_keeps_reference_data() {
    let api = Arc::new(MockApi::new());
    let sync = spawn_api(api).await;

    let mut view = DetailView::new();
    view.load(&sync, "a1").await.expect("load failed");

    let assessment = view.assessment.as_ref().unwrap();
    assert_eq!(assessment.id, "a1");
    assert_eq!(assessment.status, Visibility::Published);
    assert_eq!(assessment.run_state(), RunState::NotStarted);
    assert_eq!(assessment.course.as_ref().unwrap().code, "CSC301");

    assert_eq!(view.groups.len(), 1);
    assert_eq!(view.groups[0].sub_groups.len(), 2);
    assert_eq!(*view.ops.state(Operation::FetchPage), OpState::Idle);
}

#[tokio::test]
async fn authorize_then_end_flow() {
    let api = Arc::new(MockApi::new());
    let sync = spawn_api(api.clone()).await;

    let mut view = DetailView::new();
    view.load(&sync, "a1").await.unwrap();

    // Not started -> authorize -> ongoing.
    view.authorize(&sync).await.expect("authorize failed");
    {
        let assessment = view.assessment.as_ref().unwrap();
        assert!(assessment.authorized_to_start);
        assert_eq!(assessment.run_state(), RunState::Ongoing);
        // The mutation response carried no course; the merge must have
        // preserved the one from the initial fetch.
        assert_eq!(assessment.course.as_ref().unwrap().code, "CSC301");
    }

    // Ongoing -> end -> ended, terminally.
    view.end(&sync, Some("Paper concluded")).await.expect("end failed");
    {
        let assessment = view.assessment.as_ref().unwrap();
        assert_eq!(assessment.end_reason.as_deref(), Some("Paper concluded"));
        assert_eq!(assessment.run_state(), RunState::Ended);
    }

    // A second end is rejected locally, without a network call.
    let result = view.end(&sync, None).await;
    assert!(matches!(result, Err(AdminError::Validation(_))));
    assert_eq!(api.end_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn end_requires_an_ongoing_run() {
    let api = Arc::new(MockApi::new());
    let sync = spawn_api(api.clone()).await;

    let mut view = DetailView::new();
    view.load(&sync, "a1").await.unwrap();

    // Never authorized: ending is a local validation failure.
    let result = view.end(&sync, None).await;
    assert!(matches!(result, Err(AdminError::Validation(_))));
    assert_eq!(api.end_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn authorize_is_a_no_op_once_ended() {
    let api = Arc::new(MockApi::new());
    {
        let mut assessment = api.assessment.lock().await;
        assessment["endReason"] = json!("time expired");
    }
    let sync = spawn_api(api.clone()).await;

    let mut view = DetailView::new();
    view.load(&sync, "a1").await.unwrap();

    view.authorize(&sync).await.expect("no-op should succeed");

    let assessment = view.assessment.as_ref().unwrap();
    assert_eq!(assessment.run_state(), RunState::Ended);
    assert!(!assessment.authorized_to_start);
    assert_eq!(api.authorize_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn duration_input_is_validated_locally() {
    let api = Arc::new(MockApi::new());
    let sync = spawn_api(api.clone()).await;

    let mut view = DetailView::new();
    view.load(&sync, "a1").await.unwrap();

    for bad in ["abc", "", "0", "-15", "12.5"] {
        let result = view.set_duration(&sync, bad).await;
        assert!(
            matches!(result, Err(AdminError::Validation(_))),
            "'{}' should be rejected",
            bad
        );
    }
    assert_eq!(api.patch_hits.load(Ordering::SeqCst), 0);

    view.set_duration(&sync, " 90 ").await.expect("update failed");
    assert_eq!(api.patch_hits.load(Ordering::SeqCst), 1);
    assert_eq!(view.assessment.as_ref().unwrap().time_limit, Some(90));
}

#[tokio::test]
async fn schedule_dates_are_validated_locally() {
    let api = Arc::new(MockApi::new());
    let sync = spawn_api(api.clone()).await;

    let mut view = DetailView::new();
    view.load(&sync, "a1").await.unwrap();

    let result = view.set_due_date(&sync, "next friday").await;
    assert!(matches!(result, Err(AdminError::Validation(_))));
    assert_eq!(api.patch_hits.load(Ordering::SeqCst), 0);

    view.set_start_date(&sync, "2025-03-01").await.expect("update failed");
    view.set_due_date(&sync, "2025-03-08").await.expect("update failed");
    assert_eq!(api.patch_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn visibility_update_round_trips() {
    let api = Arc::new(MockApi::new());
    let sync = spawn_api(api.clone()).await;

    let mut view = DetailView::new();
    view.load(&sync, "a1").await.unwrap();

    view.set_visibility(&sync, Visibility::Draft).await.unwrap();

    let assessment = view.assessment.as_ref().unwrap();
    assert_eq!(assessment.status, Visibility::Draft);
    assert_eq!(assessment.course.as_ref().unwrap().code, "CSC301");
}

#[tokio::test]
async fn delete_clears_the_snapshot() {
    let api = Arc::new(MockApi::new());
    let sync = spawn_api(api.clone()).await;

    let mut view = DetailView::new();
    view.load(&sync, "a1").await.unwrap();

    view.delete(&sync).await.expect("delete failed");
    assert!(view.assessment.is_none());
    assert_eq!(api.delete_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn export_distinguishes_not_ready_from_failure() {
    let api = Arc::new(MockApi::new());
    let sync = spawn_api(api.clone()).await;

    let mut view = DetailView::new();
    view.load(&sync, "a1").await.unwrap();

    let result = view.export_results(&sync).await;
    assert!(matches!(result, Err(AdminError::NotReady)));

    let mut ready = MockApi::new();
    ready.export_ready = true;
    let sync = spawn_api(Arc::new(ready)).await;

    let mut view = DetailView::new();
    view.load(&sync, "a1").await.unwrap();

    let bytes = view.export_results(&sync).await.expect("export failed");
    assert!(bytes.starts_with(b"reg,score"));
}

#[tokio::test]
async fn unmount_cancels_pending_fetch_without_error_state() {
    let mut api = MockApi::new();
    api.fetch_delay = Duration::from_secs(30);
    let sync = spawn_api(Arc::new(api)).await;

    let mut view = DetailView::new();
    let signal = view.cancel_signal();

    let task = tokio::spawn(async move {
        let result = view.load(&sync, "a1").await;
        (view, result)
    });

    // Simulated navigation away while the fetch is still pending.
    tokio::time::sleep(Duration::from_millis(50)).await;
    signal.cancel();

    let (view, result) = task.await.unwrap();
    assert!(matches!(result, Err(AdminError::Cancelled)));
    // Cancellation must not leave the page in an error state.
    assert_eq!(*view.ops.state(Operation::FetchPage), OpState::Idle);
    assert!(view.assessment.is_none());
}
