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

//! Officer review and subject cancellation.
//!
//! Each decision re-reads the request inside its transaction and writes
//! with a conditional update, so two officers deciding the same request
//! at once produce one winner and one `InvalidState`.

use super::RequestRegistry;
use crate::audit;
use crate::error::WorkflowError;
use crate::models::{DataRequest, RequestId, RequestStatus, UserId};

const AWAITING_APPROVAL: &[RequestStatus] = &[RequestStatus::AwaitingApproval];
const CANCELLABLE: &[RequestStatus] = &RequestStatus::CANCELLABLE;

impl RequestRegistry {
    /// Approves a request awaiting approval.
    ///
    /// Marks every context of the request approved and queues the
    /// `process` task in the same transaction as the status change.
    pub async fn approve(
        &self,
        caller: UserId,
        request_id: RequestId,
    ) -> Result<DataRequest, WorkflowError> {
        self.ensure_officer(caller, "approve data requests").await?;

        let request = self
            .dal
            .data_request()
            .approve(request_id, caller, self.config.context_chunk_size())
            .await?;

        audit::log_request_approved(&request, caller);
        Ok(request)
    }

    /// Rejects a request awaiting approval. Contexts are left as they are
    /// and nothing is queued.
    pub async fn deny(
        &self,
        caller: UserId,
        request_id: RequestId,
    ) -> Result<DataRequest, WorkflowError> {
        self.ensure_officer(caller, "deny data requests").await?;

        let request = self
            .dal
            .data_request()
            .transition(
                request_id,
                AWAITING_APPROVAL,
                RequestStatus::Rejected,
                Some(caller),
                "deny",
            )
            .await?;

        audit::log_request_rejected(&request, caller);
        Ok(request)
    }

    /// Cancels a request that has not been decided yet.
    ///
    /// Only the subject or the user who submitted the request may cancel.
    /// A discovery task already queued for the request finds it cancelled
    /// and does nothing.
    pub async fn cancel_request(
        &self,
        caller: UserId,
        request_id: RequestId,
    ) -> Result<DataRequest, WorkflowError> {
        let current = self.dal.data_request().get_by_id(request_id).await?;
        if caller != current.subject_id && caller != current.requested_by {
            return Err(self.denied(caller, format!("cancel data request {request_id}")));
        }

        let request = self
            .dal
            .data_request()
            .transition(
                request_id,
                CANCELLABLE,
                RequestStatus::Cancelled,
                None,
                "cancel",
            )
            .await?;

        audit::log_request_cancelled(&request, caller);
        Ok(request)
    }
}
