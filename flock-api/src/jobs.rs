use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use flock_core::job::{DestinationResult, JobStatus};
use flock_core::trip::{SearchFilters, Traveler, TripSubmission};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", post(create_job))
        .route("/jobs/{job_id}", get(get_job))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub travelers: Vec<TravelerRequest>,
    pub destinations: Vec<String>,
    pub outbound_date: NaiveDate,
    pub return_date: NaiveDate,
    pub default_filters: SearchFilters,
}

#[derive(Debug, Deserialize)]
pub struct TravelerRequest {
    pub name: String,
    pub origin_airport: String,
    /// Absent filters resolve to the submission's default_filters; the core
    /// only ever sees fully resolved travelers.
    #[serde(default)]
    pub filters: Option<SearchFilters>,
}

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub job_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    /// Empty until the job is complete.
    pub destinations: Vec<DestinationResult>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /jobs
/// Validate the submission, create the job in `pending` and enqueue it.
pub async fn create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<CreateJobResponse>), AppError> {
    let submission = validate_and_resolve(req)?;
    tracing::info!(
        "Job submission received: {} traveler(s), {} destination(s), {} -> {}",
        submission.travelers.len(),
        submission.destinations.len(),
        submission.outbound_date,
        submission.return_date,
    );

    let job = state
        .orchestrator
        .submit(submission)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(CreateJobResponse { job_id: job.id })))
}

/// GET /jobs/{job_id}
/// Current job record; destinations are populated once the job is complete.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobResponse>, AppError> {
    let job = state
        .repo
        .fetch_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("Job not found".to_string()))?;

    let destinations = if job.status == JobStatus::Complete {
        state
            .repo
            .fetch_result(job_id)
            .await?
            .map(|result| result.destinations)
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    Ok(Json(JobResponse {
        job_id: job.id,
        status: job.status,
        created_at: job.created_at,
        completed_at: job.completed_at,
        error: job.error,
        destinations,
    }))
}

// ============================================================================
// Validation
// ============================================================================

fn validate_and_resolve(req: CreateJobRequest) -> Result<TripSubmission, AppError> {
    let CreateJobRequest {
        travelers,
        destinations,
        outbound_date,
        return_date,
        default_filters,
    } = req;

    if travelers.is_empty() {
        return Err(AppError::ValidationError("travelers must be a non-empty list".to_string()));
    }
    if destinations.is_empty() {
        return Err(AppError::ValidationError("destinations must be a non-empty list".to_string()));
    }

    let mut seen = HashSet::new();
    for destination in &destinations {
        if !seen.insert(destination.as_str()) {
            return Err(AppError::ValidationError(format!(
                "duplicate destination: {destination}"
            )));
        }
    }

    if return_date < outbound_date {
        return Err(AppError::ValidationError(
            "return_date must not be before outbound_date".to_string(),
        ));
    }

    validate_filters(&default_filters, "default_filters")?;

    let mut resolved = Vec::with_capacity(travelers.len());
    for (i, traveler) in travelers.into_iter().enumerate() {
        let filters = traveler.filters.unwrap_or_else(|| default_filters.clone());
        validate_filters(&filters, &format!("travelers[{i}].filters"))?;
        resolved.push(Traveler {
            name: traveler.name,
            origin_airport: traveler.origin_airport,
            filters,
        });
    }

    Ok(TripSubmission {
        travelers: resolved,
        destinations,
        outbound_date,
        return_date,
        default_filters,
    })
}

fn validate_filters(filters: &SearchFilters, path: &str) -> Result<(), AppError> {
    let windows = [
        ("outbound_departure_window", filters.outbound_departure_window),
        ("outbound_arrival_window", filters.outbound_arrival_window),
        ("return_departure_window", filters.return_departure_window),
        ("return_arrival_window", filters.return_arrival_window),
    ];
    for (field, window) in windows {
        if let Some(window) = window {
            if window.earliest >= window.latest {
                return Err(AppError::ValidationError(format!(
                    "{path}.{field}: earliest must be before latest"
                )));
            }
        }
    }
    Ok(())
}
