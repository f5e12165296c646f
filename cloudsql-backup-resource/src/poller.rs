//! Polling state machine that waits for a backup run to finish.
//!
//! Each poll fetches the run by id and classifies its status:
//! - transient (`ENQUEUED`, `RUNNING`, `PENDING`): sleep one interval, poll again
//! - `SUCCESSFUL`: return the run
//! - anything else: fail with [`ResourceError::BackupFailed`], never retried
//!
//! Without a configured deadline or attempt cap the poller waits forever; the
//! cancellation token is the only other way out.

use crate::client::BackupService;
use crate::models::{BackupRun, RunPhase};
use crate::utils::{ResourceError, Result};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

pub struct BackupPoller<'a> {
    service: &'a dyn BackupService,
    interval: Duration,
    max_wait: Option<Duration>,
    max_attempts: Option<u32>,
    cancel: CancellationToken,
}

impl<'a> BackupPoller<'a> {
    pub fn new(service: &'a dyn BackupService) -> Self {
        Self {
            service,
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
            max_attempts: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Poll run `id` until it succeeds, fails, or a limit is hit.
    pub async fn wait_for_success(&self, project: &str, instance: &str, id: &str) -> Result<BackupRun> {
        let started = Instant::now();
        let mut polls: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(ResourceError::Cancelled { id: id.to_string() });
            }

            let run = self.service.get_backup_run(project, instance, id).await?;
            polls += 1;

            match run.phase() {
                RunPhase::Succeeded => {
                    info!("Backup {} successful after {} poll(s)", id, polls);
                    return Ok(run);
                }
                RunPhase::Fatal => {
                    error!("Backup {} state: {}", id, run.status);
                    return Err(ResourceError::BackupFailed {
                        id: id.to_string(),
                        status: run.status,
                    });
                }
                RunPhase::Transient => {
                    info!("Backup {} state: {}", id, run.status);
                }
            }

            let waited = started.elapsed();
            let out_of_attempts = self.max_attempts.is_some_and(|max| polls >= max);
            let out_of_time = self
                .max_wait
                .is_some_and(|max| waited + self.interval > max);
            if out_of_attempts || out_of_time {
                return Err(ResourceError::Timeout {
                    id: id.to_string(),
                    polls,
                    waited,
                });
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.cancel.cancelled() => {
                    info!("Polling of backup {} cancelled", id);
                    return Err(ResourceError::Cancelled { id: id.to_string() });
                }
            }
        }
    }
}
