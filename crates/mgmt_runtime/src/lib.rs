//! Cooperative task runtime and barrier primitive for the cluster
//! management-plane coordinator (spec §4.1 "Task Runtime", §4.2 "Barrier").

mod barrier;
mod error;
mod frame;
mod scheduler;
mod task;

pub use barrier::Barrier;
pub use error::RuntimeError;
pub use frame::Frame;
pub use scheduler::Scheduler;
pub use task::{current, TaskHandle};
