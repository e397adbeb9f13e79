use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;
use uuid::Uuid;

use flock_api::{app, AppState};
use flock_core::job::{Job, JobResult, JobStatus};
use flock_core::offer::FlightOffer;
use flock_core::provider::{LocationResolver, QueryConstraints, SearchProvider, SearchQuery};
use flock_core::repository::{JobQueue, JobRepository};
use flock_core::CoreResult;
use flock_engine::fanout::SearchFanout;
use flock_engine::orchestrator::JobOrchestrator;
use tokio::sync::Semaphore;

// ============================================================================
// In-memory fakes
// ============================================================================

struct InMemoryRepo {
    jobs: Mutex<HashMap<Uuid, Job>>,
    results: Mutex<HashMap<Uuid, JobResult>>,
}

impl InMemoryRepo {
    fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            results: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl JobRepository for InMemoryRepo {
    async fn create_job(&self, job: &Job) -> CoreResult<()> {
        self.jobs.lock().unwrap().insert(job.id, job.clone());
        Ok(())
    }

    async fn fetch_job(&self, id: Uuid) -> CoreResult<Option<Job>> {
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }

    async fn claim_job(&self, id: Uuid) -> CoreResult<Option<Job>> {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.get_mut(&id) {
            Some(job) if job.status == JobStatus::Pending => {
                job.status = JobStatus::Running;
                Ok(Some(job.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn complete_job(&self, id: Uuid, result: &JobResult) -> CoreResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get_mut(&id) {
            job.status = JobStatus::Complete;
            job.completed_at = result.completed_at;
        }
        self.results.lock().unwrap().insert(id, result.clone());
        Ok(())
    }

    async fn fail_job(&self, id: Uuid, error: &str) -> CoreResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get_mut(&id) {
            job.status = JobStatus::Failed;
            job.error = Some(error.to_string());
            job.completed_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    async fn fetch_result(&self, id: Uuid) -> CoreResult<Option<JobResult>> {
        Ok(self.results.lock().unwrap().get(&id).cloned())
    }
}

struct NullQueue;

#[async_trait]
impl JobQueue for NullQueue {
    async fn publish_job(&self, _id: Uuid) -> CoreResult<()> {
        Ok(())
    }
}

struct EmptyProvider;

#[async_trait]
impl SearchProvider for EmptyProvider {
    async fn search_offers(
        &self,
        _query: &SearchQuery,
        _constraints: &QueryConstraints,
    ) -> CoreResult<Vec<FlightOffer>> {
        Ok(vec![])
    }
}

struct EchoResolver;

#[async_trait]
impl LocationResolver for EchoResolver {
    async fn resolve_city_name(&self, iata_code: &str) -> String {
        iata_code.to_string()
    }
}

fn test_state() -> AppState {
    let repo = Arc::new(InMemoryRepo::new());
    let fanout = SearchFanout::new(
        Arc::new(EmptyProvider),
        Arc::new(EchoResolver),
        Arc::new(Semaphore::new(2)),
    );
    let orchestrator = Arc::new(JobOrchestrator::new(repo.clone(), Arc::new(NullQueue), fanout));
    AppState {
        orchestrator,
        repo,
        redis: None,
    }
}

fn valid_submission() -> serde_json::Value {
    serde_json::json!({
        "travelers": [
            {"name": "Ada", "origin_airport": "JFK", "filters": {"non_stop_only": false, "excluded_airlines": []}},
            {"name": "Grace", "origin_airport": "LAX"}
        ],
        "destinations": ["CUN", "MIA"],
        "outbound_date": "2025-11-01",
        "return_date": "2025-11-08",
        "default_filters": {"non_stop_only": false, "excluded_airlines": []}
    })
}

fn post_jobs(body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/jobs")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_create_job_starts_pending_with_empty_destinations() {
    let app = app(test_state());

    let response = app.clone().oneshot(post_jobs(&valid_submission())).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let job_id = created["job_id"].as_str().expect("job_id in response");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/jobs/{job_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let job = body_json(response).await;
    assert_eq!(job["status"], "pending");
    assert_eq!(job["destinations"], serde_json::json!([]));
    assert!(job["completed_at"].is_null());
    assert!(job["error"].is_null());
}

#[tokio::test]
async fn test_traveler_without_filters_gets_the_defaults() {
    // The second traveler in the fixture has no filters of their own; the
    // submission must still be accepted.
    let app = app(test_state());
    let response = app.oneshot(post_jobs(&valid_submission())).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_duplicate_destinations_are_rejected() {
    let mut body = valid_submission();
    body["destinations"] = serde_json::json!(["CUN", "CUN"]);

    let app = app(test_state());
    let response = app.oneshot(post_jobs(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await;
    assert!(error["error"].as_str().unwrap().contains("duplicate"));
}

#[tokio::test]
async fn test_return_before_outbound_is_rejected() {
    let mut body = valid_submission();
    body["return_date"] = serde_json::json!("2025-10-01");

    let app = app(test_state());
    let response = app.oneshot(post_jobs(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_traveler_list_is_rejected() {
    let mut body = valid_submission();
    body["travelers"] = serde_json::json!([]);

    let app = app(test_state());
    let response = app.oneshot(post_jobs(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inverted_time_window_is_rejected() {
    let mut body = valid_submission();
    body["travelers"][0]["filters"]["outbound_departure_window"] =
        serde_json::json!({"earliest": "14:00", "latest": "08:00"});

    let app = app(test_state());
    let response = app.oneshot(post_jobs(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_job_is_404() {
    let app = app(test_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/jobs/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_processed_job_reports_complete() {
    let state = test_state();
    let app = app(state.clone());

    let response = app.clone().oneshot(post_jobs(&valid_submission())).await.unwrap();
    let created = body_json(response).await;
    let job_id: Uuid = created["job_id"].as_str().unwrap().parse().unwrap();

    // Drive the worker side directly; the EmptyProvider yields no offers,
    // so the job completes with no viable destinations.
    state.orchestrator.process(job_id).await.expect("process");

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/jobs/{job_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let job = body_json(response).await;
    assert_eq!(job["status"], "complete");
    assert!(!job["completed_at"].is_null());
    assert_eq!(job["destinations"], serde_json::json!([]));
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = app(test_state());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
