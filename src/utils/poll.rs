//! Fixed-interval polling for asynchronous upstream jobs.

use std::future::Future;
use std::time::Duration;

use log::info;
use tokio::time::{Instant, sleep};

use crate::errors::{AppError, AppResult};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_POLL_BUDGET: Duration = Duration::from_secs(600);

/// Snapshot of a remote job's lifecycle state.
#[derive(Debug, Clone)]
pub struct JobStatus {
    pub status: String,
    pub error: Option<String>,
}

/// Poll a job until it reaches a terminal state or the wall-clock budget runs
/// out. "completed" is terminal success; "failed" and "canceled" are terminal
/// failures carrying the upstream error text; any other status means the job
/// is still running. No backoff or jitter, by contract a plain retry loop.
pub async fn wait_until_terminal<F, Fut>(
    mut fetch: F,
    interval: Duration,
    budget: Duration,
    label: &str,
) -> AppResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<JobStatus>>,
{
    let started = Instant::now();

    while started.elapsed() < budget {
        let job = fetch().await?;
        match job.status.as_str() {
            "completed" => return Ok(()),
            "failed" | "canceled" => {
                return Err(AppError::ApiError(format!(
                    "{} {}: {}",
                    label,
                    job.status,
                    job.error.unwrap_or_else(|| "Unknown error".to_string())
                )));
            }
            status => {
                info!("{}: {}...", label, status);
                sleep(interval).await;
            }
        }
    }

    Err(AppError::Timeout(label.to_string()))
}
