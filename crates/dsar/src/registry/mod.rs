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

//! Request Registry.
//!
//! Creates, looks up, lists and transitions data requests through their
//! lifecycle, and decides who may act on them. Every operation takes the
//! acting user explicitly; there is no ambient "current user".
//!
//! ```rust,ignore
//! let registry = RequestRegistry::new(dal, access, policy, notifier, config);
//! let request = registry
//!     .create_request(subject, subject, RequestType::Export, "")
//!     .await?;
//! // ... background discovery moves it to AwaitingApproval ...
//! registry.approve(officer, request.id).await?;
//! ```
//!
//! Officer review lives in [`review`], notifications in [`notify`].

mod notify;
mod review;

use std::sync::Arc;

use crate::access::{capabilities, AccessControl, Scope};
use crate::audit;
use crate::config::WorkflowConfig;
use crate::dal::DAL;
use crate::error::{ValidationError, WorkflowError};
use crate::ledger::ContextLedger;
use crate::models::{DataRequest, NewDataRequest, RequestId, RequestStatus, RequestType, UserId};
use crate::notifier::Notifier;
use crate::policy::PolicyOracle;

/// Entry point for data request operations.
///
/// Cheap to clone; clones share the store and collaborators.
#[derive(Clone)]
pub struct RequestRegistry {
    dal: DAL,
    access: Arc<dyn AccessControl>,
    notifier: Arc<dyn Notifier>,
    ledger: ContextLedger,
    config: WorkflowConfig,
}

impl std::fmt::Debug for RequestRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestRegistry")
            .field("dal", &self.dal)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RequestRegistry {
    pub fn new(
        dal: DAL,
        access: Arc<dyn AccessControl>,
        policy: Arc<dyn PolicyOracle>,
        notifier: Arc<dyn Notifier>,
        config: WorkflowConfig,
    ) -> Self {
        let ledger = ContextLedger::new(dal.clone(), policy, config.context_chunk_size());
        Self {
            dal,
            access,
            notifier,
            ledger,
            config,
        }
    }

    /// The context ledger bound to the same store and policy.
    pub fn ledger(&self) -> &ContextLedger {
        &self.ledger
    }

    pub fn dal(&self) -> &DAL {
        &self.dal
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Submits a request about `subject_id` on behalf of `caller`.
    ///
    /// Callers acting for someone else must be an officer or hold the
    /// make-request-for-user capability in the subject's scope. The request
    /// starts at `Pending` with its discovery task already queued.
    ///
    /// Duplicate requests are not refused here; callers that want one
    /// active request per type check [`has_ongoing_request`](Self::has_ongoing_request) first.
    pub async fn create_request(
        &self,
        caller: UserId,
        subject_id: UserId,
        request_type: RequestType,
        comments: impl Into<String>,
    ) -> Result<DataRequest, WorkflowError> {
        if !self.access.user_exists(subject_id).await {
            return Err(ValidationError::UnknownSubject(subject_id).into());
        }

        if caller != subject_id
            && !self.access.can_act_as_officer(caller).await
            && !self
                .access
                .has_capability(
                    capabilities::MAKE_REQUEST_FOR_USER,
                    Scope::User(subject_id),
                    caller,
                )
                .await
        {
            return Err(self.denied(caller, format!("create data requests for user {subject_id}")));
        }

        let request = self
            .dal
            .data_request()
            .create(NewDataRequest {
                request_type,
                subject_id,
                requested_by: caller,
                comments: comments.into(),
            })
            .await?;

        audit::log_request_created(&request);
        Ok(request)
    }

    pub async fn get_request(&self, request_id: RequestId) -> Result<DataRequest, WorkflowError> {
        self.dal.data_request().get_by_id(request_id).await
    }

    /// Lists requests.
    ///
    /// With `user_id`, returns the requests that user made or is the subject
    /// of, limited to the user and the subjects delegated to them. Without
    /// it, returns every active request when `caller` is an officer and
    /// nothing otherwise. Sorted by status, then last modification.
    pub async fn list_requests(
        &self,
        caller: UserId,
        user_id: Option<UserId>,
    ) -> Result<Vec<DataRequest>, WorkflowError> {
        match user_id {
            Some(user_id) => {
                let mut subjects = vec![user_id];
                subjects.extend(self.access.delegated_subjects(user_id).await);
                self.dal.data_request().list_for_user(user_id, subjects).await
            }
            None if self.access.can_act_as_officer(caller).await => {
                self.dal.data_request().list_active().await
            }
            None => Ok(Vec::new()),
        }
    }

    /// Whether the subject has an active request of this type.
    pub async fn has_ongoing_request(
        &self,
        subject_id: UserId,
        request_type: RequestType,
    ) -> Result<bool, WorkflowError> {
        self.dal
            .data_request()
            .has_ongoing(subject_id, request_type)
            .await
    }

    /// Sets the status unconditionally, recording the officer and comment
    /// when given. Used by background work to report progress or failure.
    pub async fn update_status(
        &self,
        request_id: RequestId,
        status: RequestStatus,
        officer_id: Option<UserId>,
        comment: Option<String>,
    ) -> Result<DataRequest, WorkflowError> {
        let request = self
            .dal
            .data_request()
            .update_status(request_id, status, officer_id, comment)
            .await?;
        audit::log_status_changed(request_id, status, officer_id);
        Ok(request)
    }

    /// Moves the request to `to` only if it is still in one of `from`.
    pub async fn advance(
        &self,
        request_id: RequestId,
        from: &'static [RequestStatus],
        to: RequestStatus,
        operation: &'static str,
    ) -> Result<DataRequest, WorkflowError> {
        let request = self
            .dal
            .data_request()
            .transition(request_id, from, to, None, operation)
            .await?;
        audit::log_status_changed(request_id, to, None);
        Ok(request)
    }

    async fn ensure_officer(&self, caller: UserId, action: &str) -> Result<(), WorkflowError> {
        if self.access.can_act_as_officer(caller).await {
            Ok(())
        } else {
            Err(self.denied(caller, action.to_string()))
        }
    }

    fn denied(&self, user_id: UserId, action: String) -> WorkflowError {
        audit::log_permission_denied(user_id, &action);
        WorkflowError::PermissionDenied { user_id, action }
    }
}
