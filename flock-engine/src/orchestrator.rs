use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use flock_core::job::{DestinationResult, Job, JobResult, JobStatus};
use flock_core::repository::{JobQueue, JobRepository};
use flock_core::trip::TripSubmission;

use crate::aggregate::Aggregator;
use crate::evaluate::RankedOffer;
use crate::fanout::{FanoutResults, SearchFanout};
use crate::{EngineError, EngineResult};

/// Top-level coordinator. Owns the job state machine
/// (pending -> running -> {complete, failed}), drives the search fanout,
/// aggregates per destination and persists the terminal transition.
pub struct JobOrchestrator {
    repo: Arc<dyn JobRepository>,
    queue: Arc<dyn JobQueue>,
    fanout: SearchFanout,
}

impl JobOrchestrator {
    pub fn new(repo: Arc<dyn JobRepository>, queue: Arc<dyn JobQueue>, fanout: SearchFanout) -> Self {
        Self { repo, queue, fanout }
    }

    /// Create a job in `pending` from a validated submission and hand it to
    /// the queue. No search starts here.
    pub async fn submit(&self, submission: TripSubmission) -> EngineResult<Job> {
        let job = Job::new(submission);
        self.repo.create_job(&job).await?;
        self.queue.publish_job(job.id).await?;
        info!("[{}] Job created and enqueued", job.id);
        Ok(job)
    }

    /// Run one delivered job to a terminal state. The claim is a conditional
    /// pending -> running transition, so a redelivered message for a job
    /// that is already running or finished is skipped rather than run twice.
    pub async fn process(&self, job_id: Uuid) -> EngineResult<()> {
        let job = match self.repo.claim_job(job_id).await? {
            Some(job) => job,
            None => {
                return match self.repo.fetch_job(job_id).await? {
                    Some(existing) => {
                        info!("[{}] Skipping redelivery, job is {}", job_id, existing.status);
                        Ok(())
                    }
                    None => Err(EngineError::JobNotFound(job_id)),
                };
            }
        };
        info!("[{}] Worker picked up job", job.id);

        let results = self.fanout.run(job.id, &job.submission).await;
        let destinations = collect_destinations(&job, &results);

        let result = JobResult {
            job_id: job.id,
            status: JobStatus::Complete,
            completed_at: Some(Utc::now()),
            error: None,
            destinations,
        };

        // Persistence of the final result is an orchestration-level fault;
        // unlike a per-pair provider error it fails the job as a whole.
        if let Err(e) = self.repo.complete_job(job.id, &result).await {
            let cause = format!("failed to persist job result: {e}");
            error!("[{}] {}", job.id, cause);
            if let Err(fail_err) = self.repo.fail_job(job.id, &cause).await {
                error!("[{}] Could not record failure: {}", job.id, fail_err);
            }
            return Err(e.into());
        }

        info!("[{}] Job complete: {} destination(s)", job.id, result.destinations.len());
        Ok(())
    }
}

// The final sequence follows submission destination order; destinations that
// fail the viability rule are omitted entirely.
fn collect_destinations(job: &Job, results: &FanoutResults) -> Vec<DestinationResult> {
    let submission = &job.submission;
    let mut destinations = Vec::new();
    for (dest_index, code) in submission.destinations.iter().enumerate() {
        let winners: Vec<Option<&RankedOffer>> = results
            .outcomes
            .iter()
            .map(|row| row[dest_index].winner())
            .collect();
        let display_name = results
            .destination_names
            .get(code)
            .cloned()
            .unwrap_or_else(|| code.clone());
        if let Some(result) = Aggregator::aggregate(code, &display_name, &submission.travelers, &winners) {
            destinations.push(result);
        }
    }
    destinations
}
