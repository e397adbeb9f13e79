pub mod aggregate;
pub mod evaluate;
pub mod fanout;
pub mod filter;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod testutil;

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("job {0} not found")]
    JobNotFound(Uuid),
    #[error(transparent)]
    Core(#[from] flock_core::CoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;
