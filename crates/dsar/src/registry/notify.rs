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

//! Notifications about requests. Delivery failures never undo a state
//! change that has already been committed.

use super::RequestRegistry;
use crate::audit;
use crate::error::WorkflowError;
use crate::models::{DataRequest, UserId};
use crate::notifier::{completion_notice, officer_summary, Message};

impl RequestRegistry {
    /// Sends the request summary to one officer. Failures are returned to
    /// the caller and not retried.
    pub async fn notify_officer(
        &self,
        officer_id: UserId,
        request: &DataRequest,
    ) -> Result<(), WorkflowError> {
        self.deliver(officer_id, request, officer_summary(request))
            .await
    }

    /// Sends the request summary to every officer. Returns how many
    /// deliveries failed.
    pub async fn notify_officers(&self, request: &DataRequest) -> usize {
        let mut failed = 0;
        for officer_id in self.access.officers().await {
            if self.notify_officer(officer_id, request).await.is_err() {
                failed += 1;
            }
        }
        failed
    }

    /// Tells the subject their request has been processed.
    pub async fn notify_completion(&self, request: &DataRequest) -> Result<(), WorkflowError> {
        self.deliver(request.subject_id, request, completion_notice(request))
            .await
    }

    async fn deliver(
        &self,
        to: UserId,
        request: &DataRequest,
        message: Message,
    ) -> Result<(), WorkflowError> {
        match self.notifier.send(to, &message.subject, &message.body).await {
            Ok(()) => {
                audit::log_notification_sent(request.id, to);
                Ok(())
            }
            Err(e) => {
                audit::log_notification_failed(request.id, to, &e.to_string());
                Err(e.into())
            }
        }
    }
}
