use crate::utils::SlicerError;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Worker initialization failed: {0}")]
    InitializationError(String),

    #[error("Task panicked: {0}")]
    TaskPanicked(String),
}

pub type WorkerResult<T> = Result<T, WorkerError>;

impl From<rayon::ThreadPoolBuildError> for WorkerError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        WorkerError::InitializationError(err.to_string())
    }
}

impl From<WorkerError> for SlicerError {
    fn from(err: WorkerError) -> Self {
        SlicerError::worker(err.to_string())
    }
}
