pub mod amadeus;
pub mod app_config;
pub mod database;
pub mod job_repo;
pub mod queue;
pub mod redis_repo;

pub use amadeus::{AmadeusClient, CachingResolver};
pub use database::DbClient;
pub use job_repo::PgJobRepository;
pub use queue::KafkaJobQueue;
pub use redis_repo::RedisClient;
