use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use flock_core::repository::JobRepository;
use flock_engine::fanout::SearchFanout;
use flock_engine::orchestrator::JobOrchestrator;
use flock_store::app_config::Config;

pub mod error;
pub mod jobs;
pub mod state;
pub mod worker;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .merge(jobs::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .with_state(state)
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({"status": "ok"}))
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let Some(redis) = &state.redis else {
        return Ok(next.run(req).await);
    };
    let Some(addr) = req
        .extensions()
        .get::<axum::extract::ConnectInfo<SocketAddr>>()
        .map(|info| info.0)
    else {
        return Ok(next.run(req).await);
    };

    let key = format!("ratelimit:{}", addr.ip());
    match redis.check_rate_limit(&key, 60, 60).await {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => Err((StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded")),
        Err(_) => Ok(next.run(req).await), // Fail open
    }
}

/// Single composition root shared by the HTTP server and the queue worker:
/// both binaries construct the same collaborators and differ only in the
/// adapter that drives them.
pub async fn compose(config: &Config) -> anyhow::Result<AppState> {
    let db = flock_store::DbClient::new(&config.database.url).await?;
    db.migrate().await?;
    let repo: Arc<dyn JobRepository> = Arc::new(flock_store::PgJobRepository::new(db.pool.clone()));

    let redis = Arc::new(flock_store::RedisClient::new(&config.redis.url).await?);
    let queue = Arc::new(flock_store::KafkaJobQueue::new(&config.kafka.brokers, &config.kafka.topic)?);

    let amadeus = Arc::new(flock_store::AmadeusClient::new(
        &config.amadeus,
        Duration::from_secs(config.search.timeout_seconds),
    )?);
    let resolver = Arc::new(flock_store::CachingResolver::new(amadeus.clone(), redis.clone()));

    // One limiter per process: the provider's rate limit is shared across
    // every concurrent pair search of every job this worker runs.
    let limiter = Arc::new(tokio::sync::Semaphore::new(config.search.max_concurrent));
    let fanout = SearchFanout::new(amadeus, resolver, limiter);
    let orchestrator = Arc::new(JobOrchestrator::new(repo.clone(), queue, fanout));

    Ok(AppState {
        orchestrator,
        repo,
        redis: Some(redis),
    })
}
