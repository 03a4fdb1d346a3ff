pub mod catalog;
pub mod registry;
pub mod retry;
pub mod scheduler;

pub use catalog::{Schedule, TaskSpec, TASK_CATALOG};
pub use registry::{TaskHandler, TaskParams, TaskRegistry};
pub use retry::{run_with_retry, TaskFuture};
pub use scheduler::{SchedulerError, TaskScheduler};
