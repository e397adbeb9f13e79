use std::sync::Arc;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use tracing::{error, info, warn};
use uuid::Uuid;

use flock_engine::orchestrator::JobOrchestrator;

/// Consume job ids from the broker and run each job to a terminal state.
/// One job at a time, end to end: the next message is taken only after the
/// current job finishes, so a worker never splits a job.
pub async fn run_job_worker(
    brokers: &str,
    group_id: &str,
    topic: &str,
    orchestrator: Arc<JobOrchestrator>,
) {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", brokers)
        .set("group.id", group_id)
        .set("enable.auto.commit", "true")
        .set("auto.offset.reset", "earliest")
        .create()
        .expect("Consumer creation failed");

    consumer.subscribe(&[topic]).expect("Can't subscribe");

    info!("Job worker started, listening for trip jobs...");

    loop {
        match consumer.recv().await {
            Err(e) => error!("Kafka error: {}", e),
            Ok(m) => {
                if let Some(payload) = m.payload_view::<str>() {
                    match payload {
                        Ok(job_id_str) => match Uuid::parse_str(job_id_str) {
                            Ok(job_id) => {
                                if let Err(e) = orchestrator.process(job_id).await {
                                    error!("Job {} failed: {}", job_id, e);
                                }
                            }
                            // A payload that is not a job id cannot be tied
                            // to any job row; log and move on.
                            Err(_) => warn!("Discarding malformed job id payload: {}", job_id_str),
                        },
                        Err(e) => error!("Error reading payload: {}", e),
                    }
                }
            }
        }
    }
}
