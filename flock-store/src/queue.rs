use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

use flock_core::repository::JobQueue;
use flock_core::{CoreError, CoreResult};

/// Kafka-backed hand-off: one message per job, the job id as both key and
/// payload. Consumer-group semantics give the single in-flight claim per
/// message; redelivery on worker loss is the broker's concern.
#[derive(Clone)]
pub struct KafkaJobQueue {
    producer: FutureProducer,
    topic: String,
}

impl KafkaJobQueue {
    pub fn new(brokers: &str, topic: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl JobQueue for KafkaJobQueue {
    async fn publish_job(&self, id: Uuid) -> CoreResult<()> {
        let key = id.to_string();
        let record = FutureRecord::to(&self.topic).key(&key).payload(&key);

        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                info!(
                    "Enqueued job {}: partition {} offset {}",
                    key, delivery.partition, delivery.offset
                );
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to enqueue job {}: {}", key, e);
                Err(CoreError::QueueError(e.to_string()))
            }
        }
    }
}
