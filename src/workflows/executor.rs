//! Per-task lifecycle tracking around a single capability call.

use crate::types::{Result, Task};
use serde::Serialize;
use std::future::Future;
use std::time::Instant;
use tracing::debug;

/// Drives one task through `running -> completed | failed`.
///
/// Failures are recorded on the task and handed back to the caller untouched;
/// whether they abort anything is the strategy's call.
pub struct TaskExecutor;

impl TaskExecutor {
    /// Mark `task` running, await `call`, and record its outcome.
    ///
    /// `call` is not polled before the task is marked running.
    pub async fn run<T, F>(task: &mut Task, call: F) -> Result<T>
    where
        T: Serialize,
        F: Future<Output = Result<T>>,
    {
        task.mark_running()?;
        debug!(task_id = %task.id, kind = %task.kind, "task dispatched");
        let started = Instant::now();

        let outcome = call.await.and_then(|output| {
            let value = serde_json::to_value(&output)?;
            Ok((output, value))
        });

        match outcome {
            Ok((output, value)) => {
                task.complete(value)?;
                debug!(
                    task_id = %task.id,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "task completed"
                );
                Ok(output)
            }
            Err(e) => {
                task.fail(e.to_string())?;
                debug!(task_id = %task.id, error = %e, "task failed");
                Err(e)
            }
        }
    }
}
