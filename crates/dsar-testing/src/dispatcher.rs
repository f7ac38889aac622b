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

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dsar::{DispatchError, QueuedTask, RequestId, TaskDispatcher};
use parking_lot::Mutex;

/// Dispatcher that records tasks instead of running them.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    dispatched: Mutex<Vec<QueuedTask>>,
    rejected: Mutex<Vec<QueuedTask>>,
    failing: AtomicBool,
    failing_requests: Mutex<HashSet<RequestId>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every dispatch fails and nothing is recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Tasks for `request_id` fail regardless of [`set_failing`](Self::set_failing).
    pub fn fail_for_request(&self, request_id: RequestId) {
        self.failing_requests.lock().insert(request_id);
    }

    pub fn dispatched(&self) -> Vec<QueuedTask> {
        self.dispatched.lock().clone()
    }

    /// Every failed dispatch attempt, in order.
    pub fn rejected(&self) -> Vec<QueuedTask> {
        self.rejected.lock().clone()
    }
}

#[async_trait]
impl TaskDispatcher for RecordingDispatcher {
    async fn dispatch(&self, task: &QueuedTask) -> Result<(), DispatchError> {
        if self.failing.load(Ordering::SeqCst)
            || self.failing_requests.lock().contains(&task.request_id())
        {
            self.rejected.lock().push(task.clone());
            return Err(DispatchError::Unavailable("recording dispatcher offline".into()));
        }
        self.dispatched.lock().push(task.clone());
        Ok(())
    }
}
