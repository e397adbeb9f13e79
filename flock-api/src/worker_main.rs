use flock_api::{compose, worker};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flock_api=debug,flock_engine=debug,flock_store=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = flock_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Flock worker");

    let state = compose(&config).await.expect("Failed to initialize application");

    worker::run_job_worker(
        &config.kafka.brokers,
        &config.kafka.group_id,
        &config.kafka.topic,
        state.orchestrator.clone(),
    )
    .await;
}
