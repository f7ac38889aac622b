/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Outbox relay: polls the task outbox and dispatches what it finds.
//!
//! SQLite has no change notification, so the relay polls at a fixed
//! interval whenever a pass found nothing to do.
//!
//! A task that fails to dispatch is deferred: its attempt count goes up and
//! it is not offered again until its backoff has passed, so a task that
//! never succeeds cannot hold a batch slot ahead of newer work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use super::TaskDispatcher;
use crate::audit;
use crate::config::{WorkflowConfig, MAX_RETRY_DELAY};
use crate::dal::DAL;
use crate::error::WorkflowError;

/// Moves queued tasks from the outbox to a [`TaskDispatcher`].
pub struct OutboxRelay {
    dal: DAL,
    dispatcher: Arc<dyn TaskDispatcher>,
    batch_size: usize,
    poll_interval: Duration,
    retry_delay: Duration,
    shutdown: AtomicBool,
    notify: Notify,
}

impl OutboxRelay {
    pub fn new(dal: DAL, dispatcher: Arc<dyn TaskDispatcher>, config: &WorkflowConfig) -> Self {
        Self {
            dal,
            dispatcher,
            batch_size: config.relay_batch_size(),
            poll_interval: config.relay_poll_interval(),
            retry_delay: config.relay_retry_delay(),
            shutdown: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Dispatches up to one batch of due tasks, earliest due first.
    ///
    /// Entries whose dispatch fails stay queued and are deferred by
    /// [`backoff`](Self::backoff). Returns how many entries were dispatched
    /// and removed.
    pub async fn run_once(&self) -> Result<usize, WorkflowError> {
        let limit = i64::try_from(self.batch_size).unwrap_or(i64::MAX);
        let tasks = self.dal.task_outbox().list_pending(limit).await?;
        let mut dispatched = 0;

        for task in tasks {
            match self.dispatcher.dispatch(&task).await {
                Ok(()) => {
                    self.dal.task_outbox().delete(task.id).await?;
                    audit::log_task_dispatched(task.id, task.kind.as_str(), task.request_id());
                    dispatched += 1;
                }
                Err(e) => {
                    audit::log_task_failed(
                        task.id,
                        task.kind.as_str(),
                        task.request_id(),
                        &e.to_string(),
                    );
                    let delay = self.backoff(task.attempts);
                    if let Err(defer_err) = self.dal.task_outbox().defer(task.id, delay).await {
                        warn!(
                            outbox_id = task.id,
                            error = %defer_err,
                            "Failed to defer task after dispatch failure"
                        );
                    }
                }
            }
        }

        Ok(dispatched)
    }

    /// Delay before the next attempt of a task that has already failed
    /// `attempts` times.
    pub fn backoff(&self, attempts: i32) -> Duration {
        retry_backoff(self.retry_delay, attempts)
    }

    /// Runs relay passes until [`shutdown`](Self::shutdown) is called.
    ///
    /// Sleeps for the poll interval after a pass that dispatched nothing or
    /// failed to read the outbox.
    pub async fn run(&self) {
        info!(
            batch_size = self.batch_size,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Outbox relay started"
        );

        while !self.shutdown.load(Ordering::SeqCst) {
            let idle = match self.run_once().await {
                Ok(0) => true,
                Ok(n) => {
                    debug!(dispatched = n, "Outbox relay pass complete");
                    false
                }
                Err(e) => {
                    error!(error = %e, "Outbox relay pass failed");
                    true
                }
            };

            if idle {
                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    _ = self.notify.notified() => {
                        debug!("Outbox relay shutdown signal received");
                    }
                }
            }
        }

        info!("Outbox relay stopped");
    }

    /// Stops [`run`](Self::run) after its current pass.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}

/// `base` doubled per earlier failure, capped at [`MAX_RETRY_DELAY`].
fn retry_backoff(base: Duration, attempts: i32) -> Duration {
    let exponent = attempts.clamp(0, 16) as u32;
    base.saturating_mul(1u32 << exponent).min(MAX_RETRY_DELAY)
}
