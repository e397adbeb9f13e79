use std::sync::Arc;

use flock_core::repository::JobRepository;
use flock_engine::orchestrator::JobOrchestrator;
use flock_store::RedisClient;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<JobOrchestrator>,
    pub repo: Arc<dyn JobRepository>,
    /// Absent in in-memory test compositions; the rate limiter then passes
    /// everything through.
    pub redis: Option<Arc<RedisClient>>,
}
