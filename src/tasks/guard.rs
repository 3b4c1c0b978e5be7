//! Failure isolation for periodic work
//!
//! A broken or panicking task is logged and skipped for this cycle; it never
//! reaches the scheduler or the tasks that run after it.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::error;

/// A task run that did not complete
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Task {task} failed: {source:#}")]
    Failed {
        task: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("Task {task} panicked: {message}")]
    Panicked { task: &'static str, message: String },
}

impl TaskError {
    pub fn task(&self) -> &'static str {
        match self {
            TaskError::Failed { task, .. } | TaskError::Panicked { task, .. } => task,
        }
    }
}

/// Run `f`, catching both errors and panics, and log any failure
pub fn run_guarded<F>(task: &'static str, f: F) -> Result<(), TaskError>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    let result = match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(TaskError::Failed { task, source }),
        Err(payload) => Err(TaskError::Panicked {
            task,
            message: panic_message(payload.as_ref()),
        }),
    };

    if let Err(e) = &result {
        error!("{}", e);
    }

    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
