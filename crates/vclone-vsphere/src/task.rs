//! Polling of asynchronous vCenter tasks (`/api/cis/tasks`).

use crate::error::{VsphereError, VsphereResult};
use crate::types::{TaskInfo, TaskStatus};
use crate::vsphere::VsphereClient;

use std::time::{Duration, Instant};

/// How to wait for a task.
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    /// Delay between status polls.
    pub poll_interval: Duration,
    /// Give up after this long. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            timeout: None,
        }
    }
}

pub struct TaskManager<'a> {
    client: &'a VsphereClient,
}

impl<'a> TaskManager<'a> {
    pub fn new(client: &'a VsphereClient) -> Self {
        Self { client }
    }

    pub async fn get_task(&self, task_id: &str) -> VsphereResult<TaskInfo> {
        let path = format!("/api/cis/tasks/{task_id}");
        self.client.get(&path).await
    }

    /// Poll until the task succeeds or fails.
    ///
    /// Returns the task's `result` (`Null` when the task produced none).
    pub async fn wait_for_task(
        &self,
        task_id: &str,
        opts: WaitOptions,
    ) -> VsphereResult<serde_json::Value> {
        let started = Instant::now();
        let mut last_status = None;

        loop {
            let info = self.get_task(task_id).await?;

            if last_status != Some(info.status) {
                tracing::debug!(task = %task_id, status = ?info.status, "task status");
                last_status = Some(info.status);
            }

            match info.status {
                TaskStatus::Succeeded => {
                    return Ok(info.result.unwrap_or(serde_json::Value::Null));
                }
                TaskStatus::Failed => {
                    return Err(VsphereError::task(format!(
                        "Task {task_id} failed: {}",
                        info.error_message()
                    )));
                }
                _ => {}
            }

            if let Some(limit) = opts.timeout {
                if started.elapsed() >= limit {
                    return Err(VsphereError::timeout(format!(
                        "Task {task_id} still {:?} after {}s",
                        info.status,
                        limit.as_secs()
                    )));
                }
            }

            tokio::time::sleep(opts.poll_interval).await;
        }
    }
}

/// Pull an object identifier out of a task result.
///
/// Clone tasks return the new VM id either as a bare string or wrapped
/// as `{ "value": "vm-123" }` depending on the vCenter build.
pub fn result_id(result: &serde_json::Value) -> Option<String> {
    match result {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Object(map) => map
            .get("value")
            .or_else(|| map.get("id"))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}
