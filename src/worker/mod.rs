mod pool;
mod task;
mod error;

pub use pool::WorkerPool;
pub use task::{Indexed, TaskOutcome, restore_order};
pub use error::{WorkerError, WorkerResult};
