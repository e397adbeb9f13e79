pub mod job;
pub mod offer;
pub mod provider;
pub mod repository;
pub mod trip;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Store error: {0}")]
    StoreError(String),
    #[error("Queue error: {0}")]
    QueueError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
