use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::trip::TripSubmission;
use crate::{CoreError, CoreResult};

/// Job lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Complete,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }

    /// Valid transitions: pending -> running -> {complete, failed}.
    /// Terminal states admit no further transition.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Complete)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

impl std::str::FromStr for JobStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "complete" => Ok(JobStatus::Complete),
            "failed" => Ok(JobStatus::Failed),
            other => Err(CoreError::InternalError(format!("unknown job status: {other}"))),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub submission: TripSubmission,
    pub error: Option<String>,
}

impl Job {
    /// Create a new job in `pending` from a validated submission.
    pub fn new(submission: TripSubmission) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
            submission,
            error: None,
        }
    }
}

// ============================================================================
// Result models
// ============================================================================

/// One leg of a round trip in the shape surfaced to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightOption {
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub duration_minutes: u32,
    pub stops: u32,
    pub airline: String,
    pub flight_numbers: Vec<String>,
    /// Half of the round-trip total. The provider does not itemize per-leg
    /// cost, so this is a derived figure.
    pub price: f64,
}

/// The single cheapest valid round trip for one traveler to one destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelerFlight {
    pub traveler_name: String,
    pub origin: String,
    pub outbound: FlightOption,
    #[serde(rename = "return")]
    pub return_flight: FlightOption,
    pub total_price: f64,
    pub currency: String,
}

/// Group price statistics over each traveler's cheapest valid total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStats {
    pub currency: String,
    /// Aligned with traveler submission order.
    pub individual_totals: Vec<f64>,
    pub total: f64,
    pub average: f64,
    pub median: f64,
    pub cheapest: f64,
    pub most_expensive: f64,
}

/// A destination that every traveler can reach under their own filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationResult {
    pub destination: String,
    pub destination_name: String,
    pub traveler_flights: Vec<TravelerFlight>,
    pub group_stats: GroupStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    /// Submission destination order; non-viable destinations are omitted
    /// entirely, never included with partial data.
    pub destinations: Vec<DestinationResult>,
}
