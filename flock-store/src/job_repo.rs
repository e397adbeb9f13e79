use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use flock_core::job::{Job, JobResult};
use flock_core::repository::JobRepository;
use flock_core::{CoreError, CoreResult};

pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const JOB_COLUMNS: &str = "id, status, submission, error, created_at, completed_at";

fn store_err(e: impl std::fmt::Display) -> CoreError {
    CoreError::StoreError(e.to_string())
}

fn row_to_job(row: &sqlx::postgres::PgRow) -> CoreResult<Job> {
    let status: String = row.try_get("status").map_err(store_err)?;
    let submission: serde_json::Value = row.try_get("submission").map_err(store_err)?;
    Ok(Job {
        id: row.try_get("id").map_err(store_err)?,
        status: status.parse()?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(store_err)?,
        completed_at: row
            .try_get::<Option<DateTime<Utc>>, _>("completed_at")
            .map_err(store_err)?,
        submission: serde_json::from_value(submission).map_err(store_err)?,
        error: row.try_get("error").map_err(store_err)?,
    })
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn create_job(&self, job: &Job) -> CoreResult<()> {
        let submission = serde_json::to_value(&job.submission).map_err(store_err)?;
        sqlx::query("INSERT INTO jobs (id, status, submission, created_at) VALUES ($1, $2, $3, $4)")
            .bind(job.id)
            .bind(job.status.as_str())
            .bind(submission)
            .bind(job.created_at)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn fetch_job(&self, id: Uuid) -> CoreResult<Option<Job>> {
        let row = sqlx::query(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        row.as_ref().map(row_to_job).transpose()
    }

    // The conditional UPDATE is the claim: only a pending row matches, so at
    // most one worker ever gets the job back, and a redelivered message for
    // a running or finished job claims nothing.
    async fn claim_job(&self, id: Uuid) -> CoreResult<Option<Job>> {
        let row = sqlx::query(&format!(
            "UPDATE jobs SET status = 'running' WHERE id = $1 AND status = 'pending' RETURNING {JOB_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        row.as_ref().map(row_to_job).transpose()
    }

    // Result insert and status flip share one transaction so a
    // partially-written result is never visible as complete. The upsert
    // keeps idempotent reprocessing safe: jobs are immutable keys and
    // overwriting the same job's result is harmless.
    async fn complete_job(&self, id: Uuid, result: &JobResult) -> CoreResult<()> {
        let data = serde_json::to_value(result).map_err(store_err)?;
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        sqlx::query(
            "INSERT INTO results (job_id, data) VALUES ($1, $2) \
             ON CONFLICT (job_id) DO UPDATE SET data = EXCLUDED.data",
        )
        .bind(id)
        .bind(data)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        let updated = sqlx::query(
            "UPDATE jobs SET status = 'complete', completed_at = $2 WHERE id = $1 AND status = 'running'",
        )
        .bind(id)
        .bind(result.completed_at)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        if updated.rows_affected() != 1 {
            return Err(CoreError::StoreError(format!(
                "job {id} was not running at completion time"
            )));
        }

        tx.commit().await.map_err(store_err)?;
        Ok(())
    }

    async fn fail_job(&self, id: Uuid, error: &str) -> CoreResult<()> {
        sqlx::query("UPDATE jobs SET status = 'failed', error = $2, completed_at = now() WHERE id = $1")
            .bind(id)
            .bind(error)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn fetch_result(&self, id: Uuid) -> CoreResult<Option<JobResult>> {
        let row = sqlx::query("SELECT data FROM results WHERE job_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        match row {
            Some(row) => {
                let data: serde_json::Value = row.try_get("data").map_err(store_err)?;
                Ok(Some(serde_json::from_value(data).map_err(store_err)?))
            }
            None => Ok(None),
        }
    }
}
